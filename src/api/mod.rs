pub mod connection;

pub use self::connection::{Connection, Session};

#[cfg(test)]
mod tests {
    mod connection_tests;
}
