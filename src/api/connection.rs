// src/api/connection.rs
//! Connection-level glue: a dialect formatter, a transaction coordinator and
//! statement logging around one driver.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::core::common::types::{ExecutionEnvelope, Value};
use crate::core::common::OxisqlError;
use crate::core::config::Config;
use crate::core::query::formatter::{CompiledStatement, Formatter};
use crate::core::query::statement::Statement;
use crate::core::transaction::{
    Coordinator, Driver, DriverError, RunResult, Scope, SqlDriver, StatementExecutor, Transaction,
    TransactionError,
};
use crate::event_engine::EventListener;

/// Logging applied to every executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StatementLog {
    enabled: bool,
    slow_threshold: Duration,
}

impl StatementLog {
    const fn from_config(config: &Config) -> Self {
        Self { enabled: config.log_statements, slow_threshold: config.slow_statement_threshold() }
    }

    fn observe(&self, envelope: &ExecutionEnvelope) {
        if self.enabled {
            debug!(
                sql = %envelope.sql,
                bindings = envelope.bindings.len(),
                elapsed = ?envelope.elapsed,
                affected_rows = envelope.affected_rows,
                "statement executed"
            );
        }
        if envelope.is_slow(self.slow_threshold) {
            warn!(
                sql = %envelope.sql,
                elapsed = ?envelope.elapsed,
                threshold = ?self.slow_threshold,
                "slow statement"
            );
        }
    }

    /// Runs one statement, filling in the elapsed time when the driver did not.
    fn timed<F>(&self, sql: &str, bindings: &[Value], run: F) -> Result<ExecutionEnvelope, DriverError>
    where
        F: FnOnce(&str, &[Value]) -> Result<ExecutionEnvelope, DriverError>,
    {
        let started = Instant::now();
        let mut envelope = run(sql, bindings)?;
        if envelope.elapsed.is_zero() {
            envelope.elapsed = started.elapsed();
        }
        self.observe(&envelope);
        Ok(envelope)
    }
}

/// A database connection: compiles statements for its dialect and runs them,
/// alone or inside transactions, through its driver.
///
/// ```
/// use oxisql::api::Connection;
/// use oxisql::core::config::Config;
/// use oxisql::core::query::{select, Condition, FilterBuilder};
/// use oxisql::core::transaction::{DriverCall, RecordingDriver, TransactionError};
///
/// let mut conn = Connection::new(RecordingDriver::new(), &Config::default());
/// let statement = select("users").where_clause(Condition::column("id").equals(1)).build();
///
/// conn.transaction(|session| -> Result<(), TransactionError<()>> {
///     session.execute(&statement)?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(conn.driver().calls().first(), Some(&DriverCall::Begin));
/// ```
pub struct Connection<D> {
    formatter: Box<dyn Formatter>,
    coordinator: Coordinator<D>,
    log: StatementLog,
}

impl<D: Driver> Connection<D> {
    pub fn new(driver: D, config: &Config) -> Self {
        Self {
            formatter: config.formatter(),
            coordinator: Coordinator::with_naming(driver, config.savepoint_naming),
            log: StatementLog::from_config(config),
        }
    }

    #[must_use]
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub const fn coordinator(&self) -> &Coordinator<D> {
        &self.coordinator
    }

    pub const fn driver(&self) -> &D {
        self.coordinator.driver()
    }

    pub fn into_driver(self) -> D {
        self.coordinator.into_driver()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.coordinator.is_active()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.coordinator.subscribe(listener);
    }

    /// # Errors
    /// Returns `OxisqlError::Compile` if the statement cannot be compiled.
    pub fn compile(&self, statement: &Statement) -> Result<CompiledStatement, OxisqlError> {
        Ok(self.formatter.compile(statement)?)
    }

    /// Compiles and runs `statement` outside of any transaction scope.
    ///
    /// # Errors
    /// Returns `OxisqlError::Compile` or `OxisqlError::Driver`.
    pub fn execute(&mut self, statement: &Statement) -> Result<ExecutionEnvelope, OxisqlError> {
        let compiled = self.compile(statement)?;
        self.execute_raw(&compiled.sql, &compiled.bindings)
    }

    /// # Errors
    /// Returns `OxisqlError::Driver` if the driver fails.
    pub fn execute_raw(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, OxisqlError> {
        let driver = self.coordinator.driver_mut();
        Ok(self.log.timed(sql, bindings, |s, b| driver.execute(s, b))?)
    }

    /// Runs `callback` in a transaction, joining the current one if any.
    ///
    /// # Errors
    /// See [`Coordinator::run`].
    pub fn transaction<T, E, F>(&mut self, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        self.run(false, callback)
    }

    /// Runs `callback` in a savepoint of the current transaction, or in a new
    /// transaction when none is open.
    ///
    /// # Errors
    /// See [`Coordinator::run`].
    pub fn savepoint<T, E, F>(&mut self, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        self.run(true, callback)
    }

    fn run<T, E, F>(&mut self, use_savepoint: bool, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        let formatter = self.formatter.as_ref();
        let log = &self.log;
        self.coordinator.run(use_savepoint, |tx| callback(&mut Session { tx, formatter, log }))
    }
}

impl<X: StatementExecutor> Connection<SqlDriver<X>> {
    /// A connection that issues transaction control as SQL through
    /// `executor`, using the configured dialect and savepoint prefix.
    pub fn with_executor(executor: X, config: &Config) -> Self {
        let driver = SqlDriver::new(executor, config.formatter(), config.savepoint_prefix.clone());
        Self::new(driver, config)
    }
}

impl<D: fmt::Debug> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.formatter.dialect_name())
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

/// Handle given to transaction callbacks run through a [`Connection`].
pub struct Session<'s, 'a, D> {
    tx: &'s mut Transaction<'a, D>,
    formatter: &'s dyn Formatter,
    log: &'s StatementLog,
}

impl<D: Driver> Session<'_, '_, D> {
    #[must_use]
    pub fn scope(&self) -> &Scope {
        self.tx.scope()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.tx.depth()
    }

    /// Compiles and runs `statement` in this scope.
    ///
    /// # Errors
    /// Returns `TransactionError::Compile` or `TransactionError::Driver`.
    pub fn execute<E>(&mut self, statement: &Statement) -> Result<ExecutionEnvelope, TransactionError<E>> {
        let compiled = self.formatter.compile(statement)?;
        Ok(self.execute_raw(&compiled.sql, &compiled.bindings)?)
    }

    /// # Errors
    /// Returns `DriverError` if the driver fails.
    pub fn execute_raw(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError> {
        let tx = &mut *self.tx;
        self.log.timed(sql, bindings, |s, b| tx.execute(s, b))
    }

    /// Nested run joining this scope.
    ///
    /// # Errors
    /// See [`Coordinator::run`].
    pub fn transaction<T, E, F>(&mut self, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        self.nested(false, callback)
    }

    /// Nested run in a new savepoint.
    ///
    /// # Errors
    /// See [`Coordinator::run`].
    pub fn savepoint<T, E, F>(&mut self, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        self.nested(true, callback)
    }

    fn nested<T, E, F>(&mut self, use_savepoint: bool, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Session<'_, '_, D>) -> Result<T, TransactionError<E>>,
    {
        let formatter = self.formatter;
        let log = self.log;
        self.tx.run(use_savepoint, |tx| callback(&mut Session { tx, formatter, log }))
    }

    /// Signal that rolls back this scope: its savepoint, or the whole
    /// transaction in the root scope. See [`Transaction::rollback_savepoint`].
    #[must_use]
    pub fn rollback_savepoint<E>(&self) -> TransactionError<E> {
        self.tx.rollback_savepoint()
    }

    #[must_use]
    pub fn rollback<E>(&self) -> TransactionError<E> {
        self.tx.rollback()
    }
}

impl<D> fmt::Debug for Session<'_, '_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("dialect", &self.formatter.dialect_name()).finish_non_exhaustive()
    }
}
