pub mod common;
pub mod config;
pub mod query;
pub mod transaction;

pub use self::config::Config;
