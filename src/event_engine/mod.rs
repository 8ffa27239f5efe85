// src/event_engine/mod.rs

// Observational notifications emitted by the transaction coordinator.
pub mod handler;

pub use handler::{CollectingListener, Dispatcher, EventListener, TracingListener, TransactionEvent};
