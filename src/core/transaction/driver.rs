// src/core/transaction/driver.rs
//! The execution boundary the coordinator and connection talk to.

use std::collections::VecDeque;

use tracing::trace;

use super::errors::DriverError;
use crate::core::common::types::{ExecutionEnvelope, Value};
use crate::core::query::formatter::Formatter;

/// Transaction control and statement execution against an SQL engine.
///
/// Calls are synchronous and issued in exactly the order the coordinator
/// decides; implementations must not reorder or batch them.
pub trait Driver {
    /// # Errors
    /// Returns `DriverError` if the engine rejects the call.
    fn begin(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the engine rejects the call.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the engine rejects the call.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the engine rejects the call.
    fn savepoint(&mut self, id: &str) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the engine rejects the call.
    fn rollback_to_savepoint(&mut self, id: &str) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the statement fails.
    fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError>;
}

/// Anything that can run SQL text with positional bindings.
pub trait StatementExecutor {
    /// # Errors
    /// Returns `DriverError` if the statement fails.
    fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError>;
}

/// A [`Driver`] that expresses transaction control as SQL statements in the
/// formatter's dialect and hands them to a [`StatementExecutor`].
///
/// Savepoints are named `<prefix><id>`.
#[derive(Debug)]
pub struct SqlDriver<X> {
    executor: X,
    formatter: Box<dyn Formatter>,
    savepoint_prefix: String,
}

impl<X: StatementExecutor> SqlDriver<X> {
    pub fn new(executor: X, formatter: Box<dyn Formatter>, savepoint_prefix: impl Into<String>) -> Self {
        Self { executor, formatter, savepoint_prefix: savepoint_prefix.into() }
    }

    pub const fn executor(&self) -> &X {
        &self.executor
    }

    pub fn into_executor(self) -> X {
        self.executor
    }

    fn savepoint_name(&self, id: &str) -> String {
        format!("{}{id}", self.savepoint_prefix)
    }

    fn control(&mut self, sql: &str) -> Result<(), DriverError> {
        trace!(sql, "issuing transaction control statement");
        self.executor.execute(sql, &[]).map(|_| ())
    }
}

impl<X: StatementExecutor> Driver for SqlDriver<X> {
    fn begin(&mut self) -> Result<(), DriverError> {
        let sql = self.formatter.begin_sql();
        self.control(sql)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.control("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.control("ROLLBACK")
    }

    fn savepoint(&mut self, id: &str) -> Result<(), DriverError> {
        let sql = self
            .formatter
            .savepoint_sql(&self.savepoint_name(id))
            .map_err(|e| DriverError::new(e.to_string()))?;
        self.control(&sql)
    }

    fn rollback_to_savepoint(&mut self, id: &str) -> Result<(), DriverError> {
        let sql = self
            .formatter
            .rollback_to_savepoint_sql(&self.savepoint_name(id))
            .map_err(|e| DriverError::new(e.to_string()))?;
        self.control(&sql)
    }

    fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError> {
        self.executor.execute(sql, bindings)
    }
}

/// A call observed by [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Begin,
    Commit,
    Rollback,
    Savepoint(String),
    RollbackToSavepoint(String),
    Execute(String),
}

/// In-memory driver that records every call in order.
///
/// Individual calls can be scripted to fail once with [`fail_on`], and
/// `execute` answers with queued envelopes before falling back to an empty
/// one.
///
/// [`fail_on`]: RecordingDriver::fail_on
#[derive(Debug, Default)]
pub struct RecordingDriver {
    calls: Vec<DriverCall>,
    failures: Vec<DriverCall>,
    responses: VecDeque<ExecutionEnvelope>,
}

impl RecordingDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call equal to `call` fail.
    pub fn fail_on(&mut self, call: DriverCall) -> &mut Self {
        self.failures.push(call);
        self
    }

    /// Queues the envelope returned by the next `execute`. Its `sql` and
    /// `bindings` are overwritten with the statement actually executed.
    pub fn push_response(&mut self, envelope: ExecutionEnvelope) -> &mut Self {
        self.responses.push_back(envelope);
        self
    }

    #[must_use]
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    #[must_use]
    pub fn count(&self, call: &DriverCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    fn record(&mut self, call: DriverCall) -> Result<(), DriverError> {
        let failure = self.failures.iter().position(|f| *f == call);
        self.calls.push(call);
        match failure {
            Some(index) => {
                let failed = self.failures.remove(index);
                Err(DriverError::new(format!("scripted failure of {failed:?}")))
            }
            None => Ok(()),
        }
    }
}

impl Driver for RecordingDriver {
    fn begin(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Begin)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Commit)
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Rollback)
    }

    fn savepoint(&mut self, id: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Savepoint(id.to_string()))
    }

    fn rollback_to_savepoint(&mut self, id: &str) -> Result<(), DriverError> {
        self.record(DriverCall::RollbackToSavepoint(id.to_string()))
    }

    fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError> {
        StatementExecutor::execute(self, sql, bindings)
    }
}

impl StatementExecutor for RecordingDriver {
    fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError> {
        self.record(DriverCall::Execute(sql.to_string()))?;
        let mut envelope =
            self.responses.pop_front().unwrap_or_else(|| ExecutionEnvelope::new(sql, Vec::new()));
        envelope.sql = sql.to_string();
        envelope.bindings = bindings.to_vec();
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::formatter::{MySqlFormatter, PostgresFormatter};

    #[test]
    fn test_recording_driver_scripted_failure_fires_once() {
        let mut driver = RecordingDriver::new();
        driver.fail_on(DriverCall::Commit);

        assert!(driver.begin().is_ok());
        assert!(driver.commit().is_err());
        assert!(driver.commit().is_ok());
        assert_eq!(driver.calls(), &[DriverCall::Begin, DriverCall::Commit, DriverCall::Commit]);
    }

    #[test]
    fn test_recording_driver_returns_queued_envelope() {
        let mut driver = RecordingDriver::new();
        driver.push_response(ExecutionEnvelope::new("", Vec::new()).with_affected_rows(3));

        let first = Driver::execute(&mut driver, "DELETE FROM t", &[]).unwrap();
        assert_eq!(first.affected_rows(), 3);
        assert_eq!(first.sql, "DELETE FROM t");

        let second = Driver::execute(&mut driver, "SELECT ?", &[Value::Integer(1)]).unwrap();
        assert_eq!(second.affected_rows(), 0);
        assert_eq!(second.bindings, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_sql_driver_renders_control_statements() {
        let mut driver = SqlDriver::new(RecordingDriver::new(), Box::new(PostgresFormatter), "sp_");
        driver.begin().unwrap();
        driver.savepoint("2").unwrap();
        driver.rollback_to_savepoint("2").unwrap();
        driver.commit().unwrap();

        let calls = driver.into_executor().take_calls();
        assert_eq!(
            calls,
            vec![
                DriverCall::Execute("BEGIN".to_string()),
                DriverCall::Execute("SAVEPOINT \"sp_2\"".to_string()),
                DriverCall::Execute("ROLLBACK TO SAVEPOINT \"sp_2\"".to_string()),
                DriverCall::Execute("COMMIT".to_string()),
            ]
        );
    }

    #[test]
    fn test_sql_driver_rejects_invalid_savepoint_name() {
        let mut driver = SqlDriver::new(RecordingDriver::new(), Box::new(PostgresFormatter), "sp-");
        let err = driver.savepoint("2").unwrap_err();
        assert!(err.message.contains("sp-2"));
        assert!(driver.executor().calls().is_empty());
    }

    #[test]
    fn test_sql_driver_uses_dialect_begin() {
        let mut driver = SqlDriver::new(RecordingDriver::new(), Box::new(MySqlFormatter), "sp_");
        driver.begin().unwrap();
        driver.rollback().unwrap();
        assert_eq!(
            driver.executor().calls(),
            &[DriverCall::Execute("START TRANSACTION".to_string()), DriverCall::Execute("ROLLBACK".to_string())]
        );
    }
}
