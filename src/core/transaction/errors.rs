// src/core/transaction/errors.rs
//! Error and control-signal types for transactional execution.

use thiserror::Error;

use crate::core::query::errors::CompileError;

/// Opaque failure reported by the execution layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Driver error{}: {message}", .code.as_ref().map(|c| format!(" [{c}]")).unwrap_or_default())]
pub struct DriverError {
    pub message: String,
    /// SQLSTATE-style code, when the engine reports one.
    pub code: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: None }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self { message: message.into(), code: Some(code.into()) }
    }
}

/// Outcome of a transaction callback other than a normal return.
///
/// The two `Rollback*` variants are control signals: they are consumed by the
/// coordinator that owns the matching scope and never reach application code
/// as errors. Everything else aborts the transaction and is returned as is.
#[derive(Error, Debug)]
pub enum TransactionError<E> {
    #[error("Rollback to savepoint {0} requested")]
    RollbackSavepoint(String),

    #[error("Transaction rollback requested")]
    RollbackTransaction,

    #[error("Savepoint {0} is not active")]
    InvalidSavepoint(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Transaction callback failed: {0}")]
    Callback(E),
}

impl<E> TransactionError<E> {
    /// Whether this is one of the rollback control signals.
    #[must_use]
    pub const fn is_signal(&self) -> bool {
        matches!(self, Self::RollbackSavepoint(_) | Self::RollbackTransaction)
    }

    /// The application error, if this is one.
    pub fn into_callback(self) -> Option<E> {
        match self {
            Self::Callback(err) => Some(err),
            _ => None,
        }
    }
}
