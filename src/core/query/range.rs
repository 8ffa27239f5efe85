// src/core/query/range.rs
//! Interval operand for `in_range` conditions.

use crate::core::common::types::Value;

/// An immutable interval. Each bound is either closed (inclusive) or open.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    lower: Value,
    lower_closed: bool,
    upper: Value,
    upper_closed: bool,
}

impl Range {
    /// `[lower, upper]`
    pub fn closed(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::with_bounds(lower, true, upper, true)
    }

    /// `(lower, upper)`
    pub fn open(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::with_bounds(lower, false, upper, false)
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::with_bounds(lower, true, upper, false)
    }

    /// `(lower, upper]`
    pub fn open_closed(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::with_bounds(lower, false, upper, true)
    }

    /// Alias of [`Range::closed_open`].
    pub fn half_open(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::closed_open(lower, upper)
    }

    /// Alias of [`Range::closed`].
    pub fn inclusive(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::closed(lower, upper)
    }

    /// Alias of [`Range::open`].
    pub fn exclusive(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Self::open(lower, upper)
    }

    fn with_bounds(
        lower: impl Into<Value>,
        lower_closed: bool,
        upper: impl Into<Value>,
        upper_closed: bool,
    ) -> Self {
        Self { lower: lower.into(), lower_closed, upper: upper.into(), upper_closed }
    }

    #[must_use]
    pub const fn lower(&self) -> &Value {
        &self.lower
    }

    #[must_use]
    pub const fn upper(&self) -> &Value {
        &self.upper
    }

    #[must_use]
    pub const fn is_lower_closed(&self) -> bool {
        self.lower_closed
    }

    #[must_use]
    pub const fn is_upper_closed(&self) -> bool {
        self.upper_closed
    }

    /// Comparison operators for the lower and upper bound.
    ///
    /// The negated pair is the complement of the interval and is meant to be
    /// joined with `OR`.
    #[must_use]
    pub const fn bound_operators(&self, negated: bool) -> (&'static str, &'static str) {
        match (negated, self.lower_closed, self.upper_closed) {
            (false, lc, uc) => (if lc { ">=" } else { ">" }, if uc { "<=" } else { "<" }),
            (true, lc, uc) => (if lc { "<" } else { "<=" }, if uc { ">" } else { ">=" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_operators_truth_table() {
        assert_eq!(Range::closed(1, 2).bound_operators(false), (">=", "<="));
        assert_eq!(Range::open(1, 2).bound_operators(false), (">", "<"));
        assert_eq!(Range::closed_open(1, 2).bound_operators(false), (">=", "<"));
        assert_eq!(Range::open_closed(1, 2).bound_operators(false), (">", "<="));

        assert_eq!(Range::closed(1, 2).bound_operators(true), ("<", ">"));
        assert_eq!(Range::open(1, 2).bound_operators(true), ("<=", ">="));
        assert_eq!(Range::closed_open(1, 2).bound_operators(true), ("<", ">="));
        assert_eq!(Range::open_closed(1, 2).bound_operators(true), ("<=", ">"));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Range::half_open(1, 5), Range::closed_open(1, 5));
        assert_eq!(Range::inclusive("a", "z"), Range::closed("a", "z"));
        assert_eq!(Range::exclusive(0.5, 1.5), Range::open(0.5, 1.5));
    }
}
