// src/core/query/formatter/statements.rs
//! Per-kind statement compilation shared by every dialect.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use super::condition::where_expr;
use super::{CompiledStatement, Formatter};
use crate::core::common::types::Value;
use crate::core::query::errors::CompileError;
use crate::core::query::statement::{
    DeleteStatement, Filter, InsertStatement, OrderDirection, Projection, SelectStatement,
    TableReference, UpdateStatement,
};

#[allow(clippy::expect_used)]
fn alias_regex() -> &'static Regex {
    static ALIAS: OnceLock<Regex> = OnceLock::new();
    ALIAS.get_or_init(|| Regex::new(r"(?i)^(.+?)\s+as\s+(\S+)$").expect("valid alias regex"))
}

fn table<F: Formatter + ?Sized>(f: &F, table: &TableReference) -> String {
    match &table.alias {
        Some(alias) => format!("{} AS {}", f.quote_identifier(&table.name), f.quote_identifier(alias)),
        None => f.quote_identifier(&table.name),
    }
}

fn projection<F: Formatter + ?Sized>(f: &F, column: &Projection) -> String {
    match column {
        Projection::Expression(sql) => sql.clone(),
        Projection::Aliased { name, alias } => {
            format!("{} AS {}", f.quote_identifier(name), f.quote_identifier(alias))
        }
        Projection::Name(name) => match alias_regex().captures(name) {
            // The alias of a bare string is appended as written.
            Some(caps) => format!("{} AS {}", f.quote_identifier(caps[1].trim()), &caps[2]),
            None => f.quote_identifier(name),
        },
    }
}

fn column_list<F: Formatter + ?Sized>(f: &F, columns: &[impl AsRef<str>]) -> String {
    columns.iter().map(|c| f.quote_identifier(c.as_ref())).collect::<Vec<_>>().join(", ")
}

fn push_where<F: Formatter + ?Sized>(
    f: &F,
    filter: &Filter,
    sql: &mut String,
    bindings: &mut Vec<Value>,
) -> Result<(), CompileError> {
    if let Some(fragment) = where_expr(f, &filter.conditions)? {
        sql.push_str(" WHERE ");
        sql.push_str(&fragment.sql);
        bindings.extend(fragment.bindings);
    }
    Ok(())
}

fn push_order_by<F: Formatter + ?Sized>(f: &F, order_by: &IndexMap<String, OrderDirection>, sql: &mut String) {
    if order_by.is_empty() {
        return;
    }
    let terms = order_by
        .iter()
        .map(|(column, direction)| format!("{} {}", f.quote_identifier(column), direction.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    sql.push_str(" ORDER BY ");
    sql.push_str(&terms);
}

/// `ORDER BY`/`LIMIT` on `UPDATE` and `DELETE`.
fn push_mutation_tail<F: Formatter + ?Sized>(f: &F, filter: &Filter, sql: &mut String) -> Result<(), CompileError> {
    if filter.order_by.is_empty() && filter.limit.is_none() {
        return Ok(());
    }
    if !f.supports_ordered_mutation() {
        return Err(CompileError::Unsupported { dialect: f.dialect_name(), clause: "ORDER BY/LIMIT" });
    }
    push_order_by(f, &filter.order_by, sql);
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(())
}

fn push_returning<F: Formatter + ?Sized>(f: &F, returning: &[String], sql: &mut String) -> Result<(), CompileError> {
    if returning.is_empty() {
        return Ok(());
    }
    if !f.supports_returning() {
        return Err(CompileError::Unsupported { dialect: f.dialect_name(), clause: "RETURNING" });
    }
    sql.push_str(" RETURNING ");
    sql.push_str(&column_list(f, returning));
    Ok(())
}

/// `SELECT [DISTINCT] cols FROM t [WHERE] [GROUP BY] [ORDER BY] [LIMIT] [OFFSET] [lock]`
pub fn select<F: Formatter + ?Sized>(f: &F, stmt: &SelectStatement) -> Result<CompiledStatement, CompileError> {
    let mut sql = String::from("SELECT ");
    let mut bindings = Vec::new();

    if stmt.distinct {
        sql.push_str("DISTINCT ");
    }
    if stmt.columns.is_empty() {
        sql.push('*');
    } else {
        let list = stmt.columns.iter().map(|c| projection(f, c)).collect::<Vec<_>>().join(", ");
        sql.push_str(&list);
    }

    sql.push_str(" FROM ");
    sql.push_str(&table(f, &stmt.filter.table));
    push_where(f, &stmt.filter, &mut sql, &mut bindings)?;

    if !stmt.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&column_list(f, &stmt.group_by));
    }
    push_order_by(f, &stmt.filter.order_by, &mut sql);

    match (stmt.filter.limit, stmt.offset) {
        (Some(limit), _) => {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (None, Some(_)) => {
            if let Some(filler) = f.offset_only_limit() {
                sql.push_str(&format!(" LIMIT {filler}"));
            }
        }
        (None, None) => {}
    }
    if let Some(offset) = stmt.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    if let Some(clause) = stmt.lock.and_then(|mode| f.lock_clause(mode)) {
        sql.push(' ');
        sql.push_str(clause);
    }

    Ok(CompiledStatement::new(sql, bindings))
}

/// `INSERT INTO t (cols) VALUES (?, ...), ... [RETURNING]`
///
/// The column set is computed once; both the column list and every row's
/// bindings follow that ordering, with `NULL` for keys a row lacks.
pub fn insert<F: Formatter + ?Sized>(f: &F, stmt: &InsertStatement) -> Result<CompiledStatement, CompileError> {
    let columns = stmt.columns();
    if columns.is_empty() {
        return Err(CompileError::EmptyDataset);
    }

    let group = format!("({})", vec!["?"; columns.len()].join(", "));
    let groups = vec![group.as_str(); stmt.dataset.len()].join(", ");

    let bindings: Vec<Value> = stmt
        .dataset
        .iter()
        .flat_map(|row| columns.iter().map(move |c| row.get(*c).cloned().unwrap_or(Value::Null)))
        .collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {groups}",
        f.quote_identifier(&stmt.table.name),
        column_list(f, &columns),
    );
    push_returning(f, &stmt.returning, &mut sql)?;

    Ok(CompiledStatement::new(sql, bindings))
}

/// `UPDATE t SET c = ?, ... [WHERE] [ORDER BY] [LIMIT] [RETURNING]`
pub fn update<F: Formatter + ?Sized>(f: &F, stmt: &UpdateStatement) -> Result<CompiledStatement, CompileError> {
    if stmt.assignments.is_empty() {
        return Err(CompileError::EmptyAssignments);
    }

    let set = stmt
        .assignments
        .keys()
        .map(|column| format!("{} = ?", f.quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("UPDATE {} SET {set}", table(f, &stmt.filter.table));
    let mut bindings: Vec<Value> = stmt.assignments.values().cloned().collect();

    push_where(f, &stmt.filter, &mut sql, &mut bindings)?;
    push_mutation_tail(f, &stmt.filter, &mut sql)?;
    push_returning(f, &stmt.returning, &mut sql)?;

    Ok(CompiledStatement::new(sql, bindings))
}

/// `DELETE FROM t [WHERE] [ORDER BY] [LIMIT] [RETURNING]`
pub fn delete<F: Formatter + ?Sized>(f: &F, stmt: &DeleteStatement) -> Result<CompiledStatement, CompileError> {
    let mut sql = format!("DELETE FROM {}", table(f, &stmt.filter.table));
    let mut bindings = Vec::new();

    push_where(f, &stmt.filter, &mut sql, &mut bindings)?;
    push_mutation_tail(f, &stmt.filter, &mut sql)?;
    push_returning(f, &stmt.returning, &mut sql)?;

    Ok(CompiledStatement::new(sql, bindings))
}
