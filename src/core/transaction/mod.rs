// This module coordinates transactions and savepoints over a driver.

pub mod coordinator;
pub mod driver;
pub mod errors;
pub mod scope;

pub use coordinator::{Coordinator, RunResult, Transaction};
pub use driver::{Driver, DriverCall, RecordingDriver, SqlDriver, StatementExecutor};
pub use errors::{DriverError, TransactionError};
pub use scope::{SavepointNaming, Scope};
