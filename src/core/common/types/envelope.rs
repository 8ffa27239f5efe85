// src/core/common/types/envelope.rs
//! Result of running one compiled statement against a driver.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::row::Row;
use super::value::Value;

/// What a driver reports back after executing SQL: the statement as sent,
/// any rows it produced, and how long it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    pub sql: String,
    pub bindings: Vec<Value>,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub elapsed: Duration,
    pub affected_rows: u64,
    pub last_insert_id: Option<i64>,
    pub started_at: DateTime<Utc>,
}

impl ExecutionEnvelope {
    /// An envelope for `sql` with no rows, started now.
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            columns: Vec::new(),
            rows: Vec::new(),
            elapsed: Duration::ZERO,
            affected_rows: 0,
            last_insert_id: None,
            started_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_rows(mut self, columns: Vec<String>, rows: Vec<Row>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    #[must_use]
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    #[must_use]
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether execution took at least `threshold`. A zero threshold never
    /// flags anything.
    #[must_use]
    pub fn is_slow(&self, threshold: Duration) -> bool {
        !threshold.is_zero() && self.elapsed >= threshold
    }

    pub fn rows(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl<'a> IntoIterator for &'a ExecutionEnvelope {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access_by_name() {
        let envelope = ExecutionEnvelope::new("SELECT id, name FROM users", Vec::new()).with_rows(
            vec!["id".to_string(), "name".to_string()],
            vec![Row::new(vec![Value::Integer(1), Value::from("ann")])],
        );
        assert_eq!(envelope.row_count(), 1);
        let first = envelope.rows().next().unwrap();
        assert_eq!(first.get_by_name(envelope.columns(), "name"), Some(&Value::from("ann")));
        assert_eq!(first.get_by_name(envelope.columns(), "missing"), None);
    }

    #[test]
    fn test_is_slow() {
        let envelope = ExecutionEnvelope::new("SELECT 1", Vec::new()).with_elapsed(Duration::from_millis(250));
        assert!(envelope.is_slow(Duration::from_millis(100)));
        assert!(envelope.is_slow(Duration::from_millis(250)));
        assert!(!envelope.is_slow(Duration::from_millis(500)));
        assert!(!envelope.is_slow(Duration::ZERO));
    }

    #[test]
    fn test_affected_rows_and_insert_id() {
        let envelope = ExecutionEnvelope::new("INSERT INTO t (a) VALUES (?)", vec![Value::Integer(1)])
            .with_affected_rows(1)
            .with_last_insert_id(42);
        assert_eq!(envelope.affected_rows(), 1);
        assert_eq!(envelope.last_insert_id, Some(42));
        assert_eq!(envelope.row_count(), 0);
    }
}
