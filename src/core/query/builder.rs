// src/core/query/builder.rs
//! Fluent builders that populate statement descriptors.
//!
//! Builders own their descriptor outright, so `clone()` yields an independent
//! copy (condition chains included) that can be extended without touching the
//! original.

use indexmap::IndexMap;

use crate::core::common::types::Value;
use crate::core::query::condition::{Condition, Connective};
use crate::core::query::errors::CompileError;
use crate::core::query::formatter::{CompiledStatement, Formatter};
use crate::core::query::statement::{
    DeleteStatement, Filter, InsertStatement, LockMode, OrderDirection, Projection, SelectStatement,
    Statement, UpdateStatement,
};

/// Methods shared by builders whose statement has a `WHERE` clause.
pub trait FilterBuilder: Sized {
    fn filter_mut(&mut self) -> &mut Filter;

    #[must_use]
    fn alias(mut self, alias: impl Into<String>) -> Self {
        self.filter_mut().table.alias = Some(alias.into());
        self
    }

    /// Adds a top-level chain. Top-level chains are joined with `AND`.
    #[must_use]
    fn where_clause(mut self, condition: Condition) -> Self {
        self.filter_mut().conditions.push(condition);
        self
    }

    /// ORs `condition` onto the last top-level chain, or adds it as the first.
    #[must_use]
    fn or_where(mut self, condition: Condition) -> Self {
        let conditions = &mut self.filter_mut().conditions;
        match conditions.last_mut() {
            Some(last) => last.extend(Connective::Or, condition),
            None => conditions.push(condition),
        }
        self
    }

    /// Adds or replaces the direction for `column`, keeping its first position.
    #[must_use]
    fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.filter_mut().order_by.insert(column.into(), direction);
        self
    }

    #[must_use]
    fn limit(mut self, limit: u64) -> Self {
        self.filter_mut().limit = Some(limit);
        self
    }

    fn last_condition_mut(&mut self) -> Option<&mut Condition> {
        self.filter_mut().conditions.last_mut()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectBuilder {
    statement: SelectStatement,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { statement: SelectStatement::new(table) }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<Projection>) -> Self {
        self.statement.columns.push(column.into());
        self
    }

    #[must_use]
    pub fn columns<I, P>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        self.statement.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn column_as(mut self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.statement.columns.push(Projection::Aliased { name: name.into(), alias: alias.into() });
        self
    }

    /// Adds SQL text to the projection list without any quoting.
    #[must_use]
    pub fn expr(mut self, sql: impl Into<String>) -> Self {
        self.statement.columns.push(Projection::Expression(sql.into()));
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.statement.distinct = true;
        self
    }

    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statement.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.statement.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn lock(mut self, mode: LockMode) -> Self {
        self.statement.lock = Some(mode);
        self
    }

    #[must_use]
    pub const fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    #[must_use]
    pub fn build(self) -> Statement {
        Statement::Select(self.statement)
    }

    /// # Errors
    /// Returns `CompileError` if a condition cannot be rendered.
    pub fn compile(&self, formatter: &dyn Formatter) -> Result<CompiledStatement, CompileError> {
        formatter.compile_select(&self.statement)
    }
}

impl FilterBuilder for SelectBuilder {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.statement.filter
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    statement: InsertStatement,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { statement: InsertStatement::new(table) }
    }

    /// Appends one row.
    #[must_use]
    pub fn row<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.statement.dataset.push(row.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    #[must_use]
    pub fn rows<R, I, K, V>(self, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        rows.into_iter().fold(self, |builder, row| builder.row(row))
    }

    /// Sets a column on the last row, starting a row if there is none.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        if self.statement.dataset.is_empty() {
            self.statement.dataset.push(IndexMap::new());
        }
        if let Some(row) = self.statement.dataset.last_mut() {
            row.insert(column.into(), value.into());
        }
        self
    }

    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statement.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn statement(&self) -> &InsertStatement {
        &self.statement
    }

    #[must_use]
    pub fn build(self) -> Statement {
        Statement::Insert(self.statement)
    }

    /// # Errors
    /// Returns `CompileError::EmptyDataset` if no row was added.
    pub fn compile(&self, formatter: &dyn Formatter) -> Result<CompiledStatement, CompileError> {
        formatter.compile_insert(&self.statement)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    statement: UpdateStatement,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { statement: UpdateStatement::new(table) }
    }

    /// Assigns `value` to `column`. Reassigning keeps the original position.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statement.assignments.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statement.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn statement(&self) -> &UpdateStatement {
        &self.statement
    }

    #[must_use]
    pub fn build(self) -> Statement {
        Statement::Update(self.statement)
    }

    /// # Errors
    /// Returns `CompileError::EmptyAssignments` if nothing was set.
    pub fn compile(&self, formatter: &dyn Formatter) -> Result<CompiledStatement, CompileError> {
        formatter.compile_update(&self.statement)
    }
}

impl FilterBuilder for UpdateBuilder {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.statement.filter
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    statement: DeleteStatement,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { statement: DeleteStatement::new(table) }
    }

    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statement.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn statement(&self) -> &DeleteStatement {
        &self.statement
    }

    #[must_use]
    pub fn build(self) -> Statement {
        Statement::Delete(self.statement)
    }

    /// # Errors
    /// Returns `CompileError` if a condition cannot be rendered.
    pub fn compile(&self, formatter: &dyn Formatter) -> Result<CompiledStatement, CompileError> {
        formatter.compile_delete(&self.statement)
    }
}

impl FilterBuilder for DeleteBuilder {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.statement.filter
    }
}

pub fn select(table: impl Into<String>) -> SelectBuilder {
    SelectBuilder::new(table)
}

pub fn insert(table: impl Into<String>) -> InsertBuilder {
    InsertBuilder::new(table)
}

pub fn update(table: impl Into<String>) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

pub fn delete(table: impl Into<String>) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
