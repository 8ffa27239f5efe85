pub mod error;
pub mod types;

pub use error::OxisqlError;

#[cfg(test)]
mod tests {
    mod error_tests;
}
