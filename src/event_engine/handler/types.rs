// src/event_engine/handler/types.rs

use crate::core::transaction::Scope;

/// Lifecycle notifications of transaction scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEvent {
    /// A scope was opened; `depth` is the stack depth including it.
    Began { scope: Scope, depth: usize },
    /// The root transaction committed.
    Committed,
    /// The root transaction was rolled back.
    RolledBack,
    /// The engine was rolled back to savepoint `id`.
    RolledBackToSavepoint { id: String },
}

impl TransactionEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Began { .. } => "began",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::RolledBackToSavepoint { .. } => "rolled_back_to_savepoint",
        }
    }
}

/// Result of handing an event to a listener. Failures are logged by the
/// dispatcher and otherwise ignored.
pub type EventResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
