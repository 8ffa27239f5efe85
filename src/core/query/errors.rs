// src/core/query/errors.rs
//! Errors raised while compiling a statement into SQL text and bindings.

use thiserror::Error;

use super::condition::Operator;

/// A malformed statement. Never retryable: the statement must be fixed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("operator {0} has no negated form")]
    NonNegatable(Operator),

    #[error("too many parameters: expected a single value, got {0}")]
    TooManyParameters(usize),

    #[error("operator {operator} expects {expected} parameter(s), got {found}")]
    MissingParameters { operator: Operator, expected: usize, found: usize },

    #[error("operator {operator} expects {expected}")]
    InvalidOperand { operator: Operator, expected: &'static str },

    #[error("condition on column '{0}' has no operator")]
    IncompleteCondition(String),

    #[error("insert statement has no rows")]
    EmptyDataset,

    #[error("update statement has no assignments")]
    EmptyAssignments,

    #[error("{clause} is not supported by the {dialect} dialect")]
    Unsupported { dialect: &'static str, clause: &'static str },

    #[error("invalid savepoint identifier '{0}'")]
    InvalidSavepointId(String),
}
