// src/core/query/formatter/mod.rs
//! Compilation of statement descriptors into SQL text plus bindings.
//!
//! [`Formatter`] carries the compilation algorithm as provided methods; a
//! dialect overrides only the hooks that differ (identifier quoting, lock
//! clauses, clauses it lacks). Compilation is pure: the same descriptor
//! always yields byte-identical output.
//!
//! Every renderer returns its SQL fragment together with the bindings for
//! the placeholders it emitted, so text and values are produced by a single
//! traversal and cannot fall out of step.

pub mod condition;
pub mod dialects;
pub mod statements;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::common::types::Value;
use crate::core::query::condition::Condition;
use crate::core::query::errors::CompileError;
use crate::core::query::statement::{
    DeleteStatement, InsertStatement, LockMode, SelectStatement, Statement, UpdateStatement,
};

pub use condition::Fragment;
pub use dialects::{GenericFormatter, MySqlFormatter, PostgresFormatter, SqliteFormatter};

/// Output of a compilation: SQL text and one binding per `?`, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl CompiledStatement {
    #[must_use]
    pub const fn new(sql: String, bindings: Vec<Value>) -> Self {
        Self { sql, bindings }
    }

    /// Number of `?` placeholders in the SQL text.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bindings)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[allow(clippy::expect_used)]
fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)?$").expect("valid identifier regex")
    })
}

/// Plain identifier, optionally qualified with a table name.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// A dialect-specific SQL compiler.
pub trait Formatter: fmt::Debug + Send + Sync {
    /// Name used in error messages and logs.
    fn dialect_name(&self) -> &'static str;

    /// Character used to quote identifiers; `None` leaves them bare.
    fn quote_char(&self) -> Option<char> {
        None
    }

    /// Clause appended for a `SELECT ... FOR` lock, or `None` to omit it.
    fn lock_clause(&self, mode: LockMode) -> Option<&'static str> {
        Some(match mode {
            LockMode::ForUpdate => "FOR UPDATE",
            LockMode::ForShare => "FOR SHARE",
        })
    }

    fn supports_returning(&self) -> bool {
        true
    }

    /// Whether `UPDATE`/`DELETE` accept `ORDER BY` and `LIMIT`.
    fn supports_ordered_mutation(&self) -> bool {
        true
    }

    /// `LIMIT` value emitted when only an offset was requested, for dialects
    /// that cannot express `OFFSET` alone.
    fn offset_only_limit(&self) -> Option<&'static str> {
        None
    }

    /// Quotes a plain (optionally `table.`-qualified) identifier. Anything
    /// else is returned verbatim, which lets callers pass SQL expressions.
    fn quote_identifier(&self, name: &str) -> String {
        let Some(quote) = self.quote_char() else {
            return name.to_string();
        };
        if !is_identifier(name) {
            return name.to_string();
        }
        name.split('.')
            .map(|part| format!("{quote}{part}{quote}"))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// # Errors
    /// Returns `CompileError` if the statement is malformed for this dialect.
    fn compile(&self, statement: &Statement) -> Result<CompiledStatement, CompileError> {
        match statement {
            Statement::Select(s) => self.compile_select(s),
            Statement::Insert(s) => self.compile_insert(s),
            Statement::Update(s) => self.compile_update(s),
            Statement::Delete(s) => self.compile_delete(s),
        }
    }

    /// # Errors
    /// Returns `CompileError` if a condition cannot be rendered.
    fn compile_select(&self, statement: &SelectStatement) -> Result<CompiledStatement, CompileError> {
        statements::select(self, statement)
    }

    /// # Errors
    /// Returns `CompileError::EmptyDataset` for an insert without rows.
    fn compile_insert(&self, statement: &InsertStatement) -> Result<CompiledStatement, CompileError> {
        statements::insert(self, statement)
    }

    /// # Errors
    /// Returns `CompileError::EmptyAssignments` for an update without assignments.
    fn compile_update(&self, statement: &UpdateStatement) -> Result<CompiledStatement, CompileError> {
        statements::update(self, statement)
    }

    /// # Errors
    /// Returns `CompileError` if a condition cannot be rendered.
    fn compile_delete(&self, statement: &DeleteStatement) -> Result<CompiledStatement, CompileError> {
        statements::delete(self, statement)
    }

    /// Renders a single chain.
    ///
    /// # Errors
    /// Returns `CompileError` if any node cannot be rendered.
    fn condition_expr(&self, condition: &Condition) -> Result<Fragment, CompileError> {
        condition::chain(self, condition)
    }

    /// `SAVEPOINT <name>`
    ///
    /// # Errors
    /// Returns `CompileError::InvalidSavepointId` unless `name` is a plain
    /// identifier.
    fn savepoint_sql(&self, name: &str) -> Result<String, CompileError> {
        Ok(format!("SAVEPOINT {}", self.savepoint_name(name)?))
    }

    /// `ROLLBACK TO SAVEPOINT <name>`
    ///
    /// # Errors
    /// Returns `CompileError::InvalidSavepointId` unless `name` is a plain
    /// identifier.
    fn rollback_to_savepoint_sql(&self, name: &str) -> Result<String, CompileError> {
        Ok(format!("ROLLBACK TO SAVEPOINT {}", self.savepoint_name(name)?))
    }

    /// Quoted savepoint name. Qualified names are rejected.
    ///
    /// # Errors
    /// Returns `CompileError::InvalidSavepointId` for anything but a plain
    /// identifier.
    fn savepoint_name(&self, name: &str) -> Result<String, CompileError> {
        if name.contains('.') || !is_identifier(name) {
            return Err(CompileError::InvalidSavepointId(name.to_string()));
        }
        Ok(self.quote_identifier(name))
    }

    fn begin_sql(&self) -> &'static str {
        "BEGIN"
    }
}
