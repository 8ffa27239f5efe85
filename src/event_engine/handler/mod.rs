// src/event_engine/handler/mod.rs

// - "types.rs": the events and the listener result type
// - "processors.rs": the listener trait and the stock listeners
// - "core.rs": fan-out of one event to every registered listener

pub mod core;
pub mod processors;
pub mod types;

pub use self::core::Dispatcher;
pub use processors::{CollectingListener, EventListener, TracingListener};
pub use types::{EventResult, TransactionEvent};
