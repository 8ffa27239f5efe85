#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![warn(clippy::cast_sign_loss)]
#![forbid(unsafe_code)]
#![deny(clippy::todo, clippy::module_inception, clippy::wildcard_imports, clippy::correctness)]
#![warn(clippy::missing_const_for_fn, clippy::all)]

//! # Oxisql: SQL condition compilation and nested transactions
//!
//! `oxisql` sits between application code and an SQL engine:
//! - Fluent builders describe `SELECT`, `INSERT`, `UPDATE` and `DELETE`
//!   statements, including chained `WHERE` conditions with ranges, `IN`
//!   lists, negation and raw fragments
//! - A dialect [`Formatter`] compiles a statement into parameterized SQL text
//!   plus an ordered list of bindings
//! - A [`Coordinator`] maps nested units of work onto one engine transaction
//!   with savepoints, and rolls back to exactly the scope that asked for it
//!
//! [`Connection`] ties the three together around a [`Driver`].

pub mod api;
pub mod core;
pub mod event_engine;

// Re-export key types for easier use by library consumers
pub use crate::api::{Connection, Session};
pub use crate::core::common::types::{ExecutionEnvelope, Row, Value};
pub use crate::core::common::OxisqlError;
pub use crate::core::config::{Config, Dialect};
pub use crate::core::query::{
    delete, insert, select, update, CompileError, CompiledStatement, Condition, FilterBuilder, Formatter, Range,
    Statement,
};
pub use crate::core::transaction::{Coordinator, Driver, DriverError, Scope, TransactionError};

/// Core result type for the library
pub type Result<T> = std::result::Result<T, OxisqlError>;

#[cfg(test)]
mod tests {
    use crate::{select, Condition, Config, Connection, FilterBuilder, TransactionError};
    use crate::core::transaction::{DriverCall, RecordingDriver};

    #[test]
    fn crate_root_exports_compose() {
        let mut conn = Connection::new(RecordingDriver::new(), &Config::default());
        let statement = select("t").where_clause(Condition::column("id").is_in([1, 2])).build();

        let rows = conn
            .transaction(|session| -> Result<usize, TransactionError<()>> {
                Ok(session.execute(&statement)?.row_count())
            })
            .unwrap();

        assert_eq!(rows, Some(0));
        assert_eq!(
            conn.driver().calls(),
            &[
                DriverCall::Begin,
                DriverCall::Execute("SELECT * FROM t WHERE id IN (?, ?)".to_string()),
                DriverCall::Commit,
            ]
        );
    }

    #[test]
    fn result_alias_carries_oxisql_error() {
        let result: crate::Result<()> = Err(crate::OxisqlError::Configuration("bad".to_string()));
        assert!(result.is_err());
    }
}
