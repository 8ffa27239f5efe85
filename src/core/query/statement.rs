// src/core/query/statement.rs
//! Plain data descriptors for the four statement kinds.
//!
//! Descriptors hold no behaviour beyond simple accessors; they are filled by
//! the builders in [`super::builder`] and consumed by a
//! [`Formatter`](super::formatter::Formatter).

use indexmap::{IndexMap, IndexSet};

use crate::core::common::types::Value;
use crate::core::query::condition::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Row locking requested by a `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    ForUpdate,
    ForShare,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TableReference {
    pub name: String,
    pub alias: Option<String>,
}

impl TableReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), alias: None }
    }
}

/// One entry of a `SELECT` list.
#[derive(Debug, PartialEq, Clone)]
pub enum Projection {
    /// A bare string: a column, `table.column`, `*`, or any SQL text,
    /// optionally followed by `AS alias`.
    Name(String),
    /// A column with an explicit alias.
    Aliased { name: String, alias: String },
    /// SQL text rendered exactly as given.
    Expression(String),
}

impl From<&str> for Projection {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Projection {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Attributes shared by statements that filter rows.
#[derive(Debug, PartialEq, Clone)]
pub struct Filter {
    pub table: TableReference,
    /// Top-level chains, implicitly joined with `AND`.
    pub conditions: Vec<Condition>,
    pub order_by: IndexMap<String, OrderDirection>,
    pub limit: Option<u64>,
}

impl Filter {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: TableReference::new(table),
            conditions: Vec::new(),
            order_by: IndexMap::new(),
            limit: None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SelectStatement {
    pub filter: Filter,
    pub columns: Vec<Projection>,
    pub distinct: bool,
    pub group_by: Vec<String>,
    pub offset: Option<u64>,
    pub lock: Option<LockMode>,
}

impl SelectStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            filter: Filter::new(table),
            columns: Vec::new(),
            distinct: false,
            group_by: Vec::new(),
            offset: None,
            lock: None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct InsertStatement {
    pub table: TableReference,
    pub dataset: Vec<IndexMap<String, Value>>,
    pub returning: Vec<String>,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: TableReference::new(table), dataset: Vec::new(), returning: Vec::new() }
    }

    /// Union of the keys of every row, in first-seen order.
    ///
    /// The compiler computes this once and uses the same ordering for the
    /// column list and for extracting each row's bindings.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let columns: IndexSet<&str> =
            self.dataset.iter().flat_map(|row| row.keys().map(String::as_str)).collect();
        columns.into_iter().collect()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct UpdateStatement {
    pub filter: Filter,
    pub assignments: IndexMap<String, Value>,
    pub returning: Vec<String>,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self { filter: Filter::new(table), assignments: IndexMap::new(), returning: Vec::new() }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeleteStatement {
    pub filter: Filter,
    pub returning: Vec<String>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self { filter: Filter::new(table), returning: Vec::new() }
    }
}

/// A statement of any kind, ready to be compiled.
#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

impl Statement {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Select(s) => &s.filter.table.name,
            Self::Insert(s) => &s.table.name,
            Self::Update(s) => &s.filter.table.name,
            Self::Delete(s) => &s.filter.table.name,
        }
    }
}

impl From<SelectStatement> for Statement {
    fn from(s: SelectStatement) -> Self {
        Self::Select(s)
    }
}

impl From<InsertStatement> for Statement {
    fn from(s: InsertStatement) -> Self {
        Self::Insert(s)
    }
}

impl From<UpdateStatement> for Statement {
    fn from(s: UpdateStatement) -> Self {
        Self::Update(s)
    }
}

impl From<DeleteStatement> for Statement {
    fn from(s: DeleteStatement) -> Self {
        Self::Delete(s)
    }
}
