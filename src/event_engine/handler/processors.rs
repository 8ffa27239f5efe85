// src/event_engine/handler/processors.rs

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::types::{EventResult, TransactionEvent};

/// Receives transaction notifications.
pub trait EventListener: Send + Sync {
    /// # Errors
    /// A failing listener does not affect the transaction.
    fn on_event(&self, event: &TransactionEvent) -> EventResult;
}

/// Writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl EventListener for TracingListener {
    fn on_event(&self, event: &TransactionEvent) -> EventResult {
        match event {
            TransactionEvent::Began { scope, depth } => debug!(%scope, depth, "transaction scope began"),
            TransactionEvent::Committed => info!("transaction committed"),
            TransactionEvent::RolledBack => info!("transaction rolled back"),
            TransactionEvent::RolledBackToSavepoint { id } => info!(id, "rolled back to savepoint"),
        }
        Ok(())
    }
}

/// Keeps every event it receives. Clones share the same buffer, so a test
/// can keep one handle and subscribe another.
#[derive(Debug, Clone, Default)]
pub struct CollectingListener {
    events: Arc<Mutex<Vec<TransactionEvent>>>,
}

impl CollectingListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<TransactionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl EventListener for CollectingListener {
    fn on_event(&self, event: &TransactionEvent) -> EventResult {
        self.events.lock().map_err(|_| "event buffer poisoned")?.push(event.clone());
        Ok(())
    }
}
