// src/core/query/formatter/dialects.rs
//! Concrete formatters. Each overrides only the hooks where its dialect
//! departs from the generic rendering.

use super::Formatter;
use crate::core::query::statement::LockMode;

/// ANSI-flavoured output with bare identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFormatter;

impl Formatter for GenericFormatter {
    fn dialect_name(&self) -> &'static str {
        "generic"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlFormatter;

impl Formatter for MySqlFormatter {
    fn dialect_name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> Option<char> {
        Some('`')
    }

    fn lock_clause(&self, mode: LockMode) -> Option<&'static str> {
        Some(match mode {
            LockMode::ForUpdate => "FOR UPDATE",
            LockMode::ForShare => "LOCK IN SHARE MODE",
        })
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn offset_only_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn begin_sql(&self) -> &'static str {
        "START TRANSACTION"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFormatter;

impl Formatter for PostgresFormatter {
    fn dialect_name(&self) -> &'static str {
        "postgres"
    }

    fn quote_char(&self) -> Option<char> {
        Some('"')
    }

    fn supports_ordered_mutation(&self) -> bool {
        false
    }
}

/// SQLite has no row locks; lock requests are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteFormatter;

impl Formatter for SqliteFormatter {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_char(&self) -> Option<char> {
        Some('"')
    }

    fn lock_clause(&self, _mode: LockMode) -> Option<&'static str> {
        None
    }

    fn offset_only_limit(&self) -> Option<&'static str> {
        Some("-1")
    }
}
