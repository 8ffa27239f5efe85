// src/core/transaction/coordinator.rs
//! Nested transaction execution over a stack of scopes.
//!
//! The outermost [`Coordinator::run`] opens the transaction with `begin`. A
//! nested run either opens a savepoint (`use_savepoint`) or joins the scope it
//! is nested in without touching the driver. Only the run that pushed a scope
//! pops it, and only the root commits, so the stack is empty again exactly
//! when the outermost run returns.
//!
//! Callbacks ask for a rollback by returning one of the signals in
//! [`TransactionError`]. `RollbackSavepoint` is carried out by the first run
//! that sees it, even when the target belongs to an outer run: the engine
//! rolls back to the savepoint and the target and every scope above it leave
//! the stack. An outer run whose scope went this way returns `Ok(None)` and
//! issues nothing itself. `RollbackTransaction` unwinds one scope per run up
//! to the root, which rolls the engine back.

use tracing::{debug, error, warn};

use super::driver::Driver;
use super::errors::{DriverError, TransactionError};
use super::scope::{SavepointNaming, Scope};
use crate::core::common::types::{ExecutionEnvelope, Value};
use crate::event_engine::{Dispatcher, EventListener, TransactionEvent};

/// Result of a transactional run: `Ok(None)` when the run's scope was rolled
/// back on request.
pub type RunResult<T, E> = Result<Option<T>, TransactionError<E>>;

/// Owns the scope stack of one connection.
#[derive(Debug)]
pub struct Coordinator<D> {
    driver: D,
    stack: Vec<Scope>,
    naming: SavepointNaming,
    savepoint_counter: u64,
    dispatcher: Dispatcher,
}

impl<D: Driver> Coordinator<D> {
    pub fn new(driver: D) -> Self {
        Self::with_naming(driver, SavepointNaming::default())
    }

    pub fn with_naming(driver: D, naming: SavepointNaming) -> Self {
        Self { driver, stack: Vec::new(), naming, savepoint_counter: 0, dispatcher: Dispatcher::new() }
    }

    /// Number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn current_scope(&self) -> Option<&Scope> {
        self.stack.last()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.dispatcher.subscribe(listener);
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Runs `callback` inside a transaction scope.
    ///
    /// Outside a transaction this begins one and commits it when the callback
    /// returns normally. Inside one, `use_savepoint` opens a savepoint for the
    /// callback; otherwise the callback joins the current scope.
    ///
    /// # Errors
    /// Returns the callback's error after unwinding, `Driver` when a control
    /// call fails, and `InvalidSavepoint` for a rollback to a savepoint that
    /// is not open. A `RollbackSavepoint` signal never escapes; a
    /// `RollbackTransaction` signal is passed on until the root run handles it.
    pub fn run<T, E, F>(&mut self, use_savepoint: bool, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Transaction<'_, D>) -> Result<T, TransactionError<E>>,
    {
        let owned = self.open_scope::<E>(use_savepoint)?;
        let scope = match (&owned, self.stack.last()) {
            (Some(own), _) => own.scope.clone(),
            (None, Some(current)) => current.clone(),
            (None, None) => Scope::Root,
        };

        let result = {
            let mut tx = Transaction { coordinator: self, scope };
            callback(&mut tx)
        };

        self.settle(owned.as_ref(), result)
    }

    /// Pushes the scope for a new run, or returns `None` when the run joins
    /// the current one.
    fn open_scope<E>(&mut self, use_savepoint: bool) -> Result<Option<OwnedScope>, TransactionError<E>> {
        if self.stack.is_empty() {
            self.driver.begin()?;
            return Ok(Some(self.push(Scope::Root)));
        }
        if !use_savepoint {
            debug!(depth = self.depth(), "joining current transaction scope");
            return Ok(None);
        }
        let id = self.next_savepoint_id();
        self.driver.savepoint(&id)?;
        Ok(Some(self.push(Scope::Savepoint(id))))
    }

    fn next_savepoint_id(&mut self) -> String {
        match self.naming {
            SavepointNaming::Depth => self.stack.len().saturating_add(1).to_string(),
            SavepointNaming::Counter => {
                self.savepoint_counter = self.savepoint_counter.saturating_add(1);
                self.savepoint_counter.to_string()
            }
        }
    }

    fn push(&mut self, scope: Scope) -> OwnedScope {
        let index = self.stack.len();
        self.stack.push(scope.clone());
        debug!(%scope, depth = self.depth(), "transaction scope began");
        self.notify(&TransactionEvent::Began { scope: scope.clone(), depth: self.depth() });
        OwnedScope { index, scope }
    }

    fn notify(&self, event: &TransactionEvent) {
        self.dispatcher.dispatch(event);
    }

    /// Whether the entry a run pushed is still open. A rollback to an outer
    /// savepoint removes the entries of every run nested inside it.
    fn holds(&self, own: &OwnedScope) -> bool {
        self.stack.get(own.index) == Some(&own.scope)
    }

    fn settle<T, E>(&mut self, own: Option<&OwnedScope>, result: Result<T, TransactionError<E>>) -> RunResult<T, E> {
        match result {
            Ok(value) => match own {
                // Joined runs own nothing; the enclosing run settles the scope.
                None => Ok(Some(value)),
                Some(own) if !self.holds(own) => Ok(None),
                Some(own) => self.finish(own).map(|()| Some(value)),
            },
            Err(TransactionError::RollbackSavepoint(id)) => self.rollback_to(own, id),
            Err(TransactionError::RollbackTransaction) => {
                if let Some(own) = own {
                    self.release(own);
                }
                if self.is_active() {
                    return Err(TransactionError::RollbackTransaction);
                }
                self.rollback_root()?;
                Ok(None)
            }
            Err(other) => Err(self.abort(own, other)),
        }
    }

    /// Normal return: the root commits, a savepoint is simply left behind
    /// for the enclosing transaction to settle.
    fn finish<E>(&mut self, own: &OwnedScope) -> Result<(), TransactionError<E>> {
        if !own.scope.is_root() {
            self.release(own);
            return Ok(());
        }
        if let Err(err) = self.driver.commit() {
            return Err(self.abort(Some(own), TransactionError::Driver(err)));
        }
        self.stack.clear();
        debug!("transaction committed");
        self.notify(&TransactionEvent::Committed);
        Ok(())
    }

    /// Rolls the engine back to savepoint `id` as soon as any run sees the
    /// signal, then drops the target and every scope above it.
    fn rollback_to<T, E>(&mut self, own: Option<&OwnedScope>, id: String) -> RunResult<T, E> {
        let Some(position) = self.stack.iter().rposition(|s| s.savepoint_id() == Some(id.as_str())) else {
            warn!(id, "rollback requested to a savepoint that is not open");
            return Err(self.abort(own, TransactionError::InvalidSavepoint(id)));
        };

        if let Err(err) = self.driver.rollback_to_savepoint(&id) {
            return Err(self.abort(own, TransactionError::Driver(err)));
        }
        debug!(id, "rolled back to savepoint");
        self.notify(&TransactionEvent::RolledBackToSavepoint { id });
        self.truncate(position);
        Ok(None)
    }

    /// Unwinds this run's scope after a failure and rolls the engine back if
    /// it was the last one. A failing rollback replaces the original error.
    fn abort<E>(&mut self, own: Option<&OwnedScope>, failure: TransactionError<E>) -> TransactionError<E> {
        if let Some(own) = own {
            self.release(own);
        }
        if self.is_active() {
            return failure;
        }
        match self.rollback_root() {
            Ok(()) => failure,
            Err(rollback_err) => {
                error!(error = %rollback_err, "rollback failed while unwinding a failed transaction");
                TransactionError::Driver(rollback_err)
            }
        }
    }

    fn rollback_root(&mut self) -> Result<(), DriverError> {
        self.driver.rollback()?;
        debug!("transaction rolled back");
        self.notify(&TransactionEvent::RolledBack);
        Ok(())
    }

    /// Pops the run's own entry, if an earlier rollback has not already.
    fn release(&mut self, own: &OwnedScope) {
        if self.holds(own) {
            self.truncate(own.index);
        }
    }

    fn truncate(&mut self, len: usize) {
        while self.stack.len() > len {
            if let Some(scope) = self.stack.pop() {
                debug!(%scope, depth = self.depth(), "transaction scope closed");
            }
        }
    }
}

/// The stack entry a run pushed, with its position.
#[derive(Debug)]
struct OwnedScope {
    index: usize,
    scope: Scope,
}

/// Handle passed to a transaction callback.
#[derive(Debug)]
pub struct Transaction<'a, D> {
    coordinator: &'a mut Coordinator<D>,
    scope: Scope,
}

impl<D: Driver> Transaction<'_, D> {
    /// The scope this callback runs in. Joined runs see the enclosing scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.coordinator.depth()
    }

    /// # Errors
    /// Returns `DriverError` if the statement fails.
    pub fn execute(&mut self, sql: &str, bindings: &[Value]) -> Result<ExecutionEnvelope, DriverError> {
        self.coordinator.driver.execute(sql, bindings)
    }

    /// Nested run; see [`Coordinator::run`].
    ///
    /// # Errors
    /// As for [`Coordinator::run`].
    pub fn run<T, E, F>(&mut self, use_savepoint: bool, callback: F) -> RunResult<T, E>
    where
        F: FnOnce(&mut Transaction<'_, D>) -> Result<T, TransactionError<E>>,
    {
        self.coordinator.run(use_savepoint, callback)
    }

    /// Signal that rolls back this callback's scope.
    ///
    /// In a savepoint scope this is `RollbackSavepoint` with the scope's id.
    /// In the root scope there is no savepoint to return to, so the signal is
    /// `RollbackTransaction` and the whole transaction is rolled back.
    #[must_use]
    pub fn rollback_savepoint<E>(&self) -> TransactionError<E> {
        match &self.scope {
            Scope::Savepoint(id) => TransactionError::RollbackSavepoint(id.clone()),
            Scope::Root => TransactionError::RollbackTransaction,
        }
    }

    /// Signal that rolls back the whole transaction.
    #[must_use]
    pub const fn rollback<E>(&self) -> TransactionError<E> {
        TransactionError::RollbackTransaction
    }

    pub fn driver(&self) -> &D {
        &self.coordinator.driver
    }
}
