use std::fmt;

use crate::core::query::errors::CompileError;
use crate::core::transaction::errors::DriverError;

#[derive(Debug)]
pub enum OxisqlError {
    Io(std::io::Error),
    Compile(CompileError),
    Driver(DriverError),
    Configuration(String),
}

impl fmt::Display for OxisqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO Error: {e}"),
            Self::Compile(e) => write!(f, "Compile Error: {e}"),
            Self::Driver(e) => write!(f, "{e}"),
            Self::Configuration(s) => write!(f, "Configuration error: {s}"),
        }
    }
}

impl std::error::Error for OxisqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Compile(e) => Some(e),
            Self::Driver(e) => Some(e),
            Self::Configuration(_) => None,
        }
    }
}

impl From<std::io::Error> for OxisqlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<CompileError> for OxisqlError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

impl From<DriverError> for OxisqlError {
    fn from(err: DriverError) -> Self {
        Self::Driver(err)
    }
}

impl From<toml::de::Error> for OxisqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
