// src/event_engine/handler/core.rs

use std::fmt;

use tracing::warn;

use super::processors::EventListener;
use super::types::TransactionEvent;

/// Fans each event out to the registered listeners, in registration order.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `event` to every listener. A failing listener is logged and
    /// skipped.
    pub fn dispatch(&self, event: &TransactionEvent) {
        for listener in &self.listeners {
            if let Err(err) = listener.on_event(event) {
                warn!(event = event.name(), error = %err, "transaction event listener failed");
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("listeners", &self.listeners.len()).finish()
    }
}
