// src/core/config.rs

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::common::OxisqlError;
use crate::core::query::formatter::{
    Formatter, GenericFormatter, MySqlFormatter, PostgresFormatter, SqliteFormatter,
};
use crate::core::transaction::SavepointNaming;

/// SQL dialect statements are compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    #[must_use]
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            Self::Generic => Box::new(GenericFormatter),
            Self::MySql => Box::new(MySqlFormatter),
            Self::Postgres => Box::new(PostgresFormatter),
            Self::Sqlite => Box::new(SqliteFormatter),
        }
    }
}

/// Connection-level settings.
///
/// Missing keys in a TOML file fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub dialect: Dialect,
    pub savepoint_naming: SavepointNaming,
    /// Log every executed statement at `debug`.
    pub log_statements: bool,
    /// Statements at or above this duration are logged at `warn`; 0 disables.
    pub slow_statement_threshold_ms: u64,
    /// Prepended to savepoint ids when rendering savepoint SQL.
    pub savepoint_prefix: String,
}

/// Builder for [`Config`]; unset fields take the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    dialect: Option<Dialect>,
    savepoint_naming: Option<SavepointNaming>,
    log_statements: Option<bool>,
    slow_statement_threshold_ms: Option<u64>,
    savepoint_prefix: Option<String>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    #[must_use]
    pub fn savepoint_naming(mut self, naming: SavepointNaming) -> Self {
        self.savepoint_naming = Some(naming);
        self
    }

    #[must_use]
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = Some(enabled);
        self
    }

    #[must_use]
    pub fn slow_statement_threshold_ms(mut self, threshold: u64) -> Self {
        self.slow_statement_threshold_ms = Some(threshold);
        self
    }

    #[must_use]
    pub fn savepoint_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.savepoint_prefix = Some(prefix.into());
        self
    }

    /// # Errors
    /// Returns `OxisqlError::Configuration` if validation fails.
    pub fn build(self) -> Result<Config, OxisqlError> {
        let defaults = Config::default();
        let config = Config {
            dialect: self.dialect.unwrap_or(defaults.dialect),
            savepoint_naming: self.savepoint_naming.unwrap_or(defaults.savepoint_naming),
            log_statements: self.log_statements.unwrap_or(defaults.log_statements),
            slow_statement_threshold_ms: self
                .slow_statement_threshold_ms
                .unwrap_or(defaults.slow_statement_threshold_ms),
            savepoint_prefix: self.savepoint_prefix.unwrap_or(defaults.savepoint_prefix),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Generic,
            savepoint_naming: SavepointNaming::Depth,
            log_statements: true,
            slow_statement_threshold_ms: 1000,
            savepoint_prefix: "sp_".to_string(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// # Errors
    /// Returns `OxisqlError::Configuration` if the savepoint prefix is not
    /// made of ASCII letters, digits and underscores.
    pub fn validate(&self) -> Result<(), OxisqlError> {
        if !self.savepoint_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OxisqlError::Configuration(format!(
                "savepoint_prefix '{}' must contain only ASCII letters, digits and underscores",
                self.savepoint_prefix
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns `OxisqlError::Configuration` if parsing or validation fails.
    pub fn from_toml_str(contents: &str) -> Result<Self, OxisqlError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file. A missing file yields the
    /// defaults.
    ///
    /// # Errors
    /// Returns `OxisqlError::Configuration` if the file cannot be parsed or is
    /// invalid, and `OxisqlError::Io` if it cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, OxisqlError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).map_err(|e| {
                OxisqlError::Configuration(format!(
                    "Failed to parse config file '{}': {e}",
                    path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(OxisqlError::Io(e)),
        }
    }

    /// # Errors
    /// As for [`Config::load_from_file`].
    pub fn load_or_default(optional_path: Option<&Path>) -> Result<Self, OxisqlError> {
        match optional_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Generic dialect, counter-named savepoints, statement logging on and
    /// no slow-statement threshold.
    ///
    /// # Errors
    /// Never fails in practice; the preset is validated like any other.
    pub fn for_testing() -> Result<Self, OxisqlError> {
        Self::builder()
            .savepoint_naming(SavepointNaming::Counter)
            .slow_statement_threshold_ms(0)
            .build()
    }

    #[must_use]
    pub fn formatter(&self) -> Box<dyn Formatter> {
        self.dialect.formatter()
    }

    #[must_use]
    pub const fn slow_statement_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_statement_threshold_ms)
    }
}
