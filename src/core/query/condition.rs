// src/core/query/condition.rs
//! Composable predicate chains.
//!
//! A [`Condition`] is an owned, append-only chain of [`ConditionNode`]s. The
//! head has no connective; every following node carries the `AND`/`OR` that
//! joins it to its predecessor. Setters always act on the last node, and
//! `and()`/`or()` append a new node that becomes the last one, so a chain reads
//! left to right exactly as it renders:
//!
//! ```
//! use oxisql::core::query::Condition;
//!
//! let cond = Condition::column("id").equals(1).or().equals(2);
//! assert_eq!(cond.len(), 2);
//! ```
//!
//! Cloning a chain copies every node; two builders never share a node.

use std::fmt;

use crate::core::common::types::Value;
use crate::core::query::range::Range;

/// Comparison operator of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    In,
    NotIn,
    Between,
    NotBetween,
    Like,
    NotLike,
    Range,
    Raw,
}

impl Operator {
    /// Splits an operator into its positive form and whether the variant
    /// itself already negates it (`NotIn` is `In` negated once).
    #[must_use]
    pub const fn positive(self) -> (Self, bool) {
        match self {
            Self::NotEquals => (Self::Equals, true),
            Self::NotIn => (Self::In, true),
            Self::NotBetween => (Self::Between, true),
            Self::NotLike => (Self::Like, true),
            other => (other, false),
        }
    }

    /// Plain comparisons that have no negated SQL spelling.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::LessThan | Self::LessOrEqual | Self::GreaterThan | Self::GreaterOrEqual)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Range => "RANGE",
            Self::Raw => "RAW",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective between two consecutive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Right-hand side of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operator has been applied yet.
    None,
    Value(Value),
    List(Vec<Value>),
    Range(Range),
    /// A nested chain, rendered as a parenthesized sub-group.
    Group(Box<Condition>),
    /// Opaque SQL text, rendered verbatim.
    Raw(String),
}

/// One predicate of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionNode {
    column: Option<String>,
    operator: Option<Operator>,
    negated: bool,
    operand: Operand,
}

impl ConditionNode {
    fn for_column(column: Option<String>) -> Self {
        Self { column, operator: None, negated: false, operand: Operand::None }
    }

    fn raw(sql: String) -> Self {
        Self { column: None, operator: Some(Operator::Raw), negated: false, operand: Operand::Raw(sql) }
    }

    fn group(inner: Condition) -> Self {
        Self { column: None, operator: None, negated: false, operand: Operand::Group(Box::new(inner)) }
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    #[must_use]
    pub const fn operator(&self) -> Option<Operator> {
        self.operator
    }

    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Replaces operator, operand and negation in one assignment.
    fn apply(&mut self, operator: Operator, operand: Operand, negated: bool) {
        let column = self.column.take();
        *self = Self { column, operator: Some(operator), negated, operand };
    }
}

/// An ordered chain of predicates joined by `AND`/`OR`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    head: ConditionNode,
    links: Vec<(Connective, ConditionNode)>,
}

impl Condition {
    /// Starts a chain on `column`. Also spelled [`Condition::for_column`].
    pub fn column(column: impl Into<String>) -> Self {
        Self::from_head(ConditionNode::for_column(Some(column.into())))
    }

    pub fn for_column(column: impl Into<String>) -> Self {
        Self::column(column)
    }

    /// Starts a chain with an opaque SQL fragment. Raw fragments carry no
    /// bindings and cannot be negated.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::from_head(ConditionNode::raw(sql.into()))
    }

    /// Starts a chain whose first node is `inner` as a parenthesized group.
    #[must_use]
    pub fn group(inner: Self) -> Self {
        Self::from_head(ConditionNode::group(inner))
    }

    const fn from_head(head: ConditionNode) -> Self {
        Self { head, links: Vec::new() }
    }

    /// Number of nodes in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len() + 1
    }

    /// A chain always has a head, so it is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub const fn head(&self) -> &ConditionNode {
        &self.head
    }

    /// Nodes in render order, each with the connective joining it to its
    /// predecessor (`None` for the head).
    pub fn nodes(&self) -> impl Iterator<Item = (Option<Connective>, &ConditionNode)> {
        std::iter::once((None, &self.head))
            .chain(self.links.iter().map(|(connective, node)| (Some(*connective), node)))
    }

    /// The node setters act on.
    #[must_use]
    pub fn tail(&self) -> &ConditionNode {
        self.links.last().map_or(&self.head, |(_, node)| node)
    }

    fn tail_mut(&mut self) -> &mut ConditionNode {
        match self.links.last_mut() {
            Some((_, node)) => node,
            None => &mut self.head,
        }
    }

    fn set(mut self, operator: Operator, operand: Operand, negated: bool) -> Self {
        self.tail_mut().apply(operator, operand, negated);
        self
    }

    /// Low-level setter: applies `operator` with an arbitrary operand. `IN`
    /// lists are normalized as in [`Condition::is_in`].
    #[must_use]
    pub fn with(self, operator: Operator, operand: Operand) -> Self {
        let operand = match (operator.positive().0, operand) {
            (Operator::In, Operand::List(values)) => Operand::List(normalize_list(values)),
            (_, operand) => operand,
        };
        self.set(operator, operand, false)
    }

    /// `col = value`, or `col IS NULL` when `value` is null.
    #[must_use]
    pub fn equals(self, value: impl Into<Value>) -> Self {
        self.set(Operator::Equals, Operand::Value(value.into()), false)
    }

    /// `col != value`, or `col IS NOT NULL` when `value` is null.
    #[must_use]
    pub fn not_equals(self, value: impl Into<Value>) -> Self {
        self.set(Operator::Equals, Operand::Value(value.into()), true)
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        self.equals(Value::Null)
    }

    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.not_equals(Value::Null)
    }

    #[must_use]
    pub fn less_than(self, value: impl Into<Value>) -> Self {
        self.set(Operator::LessThan, Operand::Value(value.into()), false)
    }

    #[must_use]
    pub fn less_or_equal(self, value: impl Into<Value>) -> Self {
        self.set(Operator::LessOrEqual, Operand::Value(value.into()), false)
    }

    #[must_use]
    pub fn greater_than(self, value: impl Into<Value>) -> Self {
        self.set(Operator::GreaterThan, Operand::Value(value.into()), false)
    }

    #[must_use]
    pub fn greater_or_equal(self, value: impl Into<Value>) -> Self {
        self.set(Operator::GreaterOrEqual, Operand::Value(value.into()), false)
    }

    /// `col IN (...)`. Duplicates and nulls are dropped; an empty list
    /// compiles to a predicate that matches nothing.
    #[must_use]
    pub fn is_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set(Operator::In, Operand::List(normalize_list(values)), false)
    }

    #[must_use]
    pub fn not_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.set(Operator::In, Operand::List(normalize_list(values)), true)
    }

    #[must_use]
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.set(Operator::Between, Operand::List(vec![low.into(), high.into()]), false)
    }

    #[must_use]
    pub fn not_between(self, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.set(Operator::Between, Operand::List(vec![low.into(), high.into()]), true)
    }

    #[must_use]
    pub fn like(self, pattern: impl Into<Value>) -> Self {
        self.set(Operator::Like, Operand::Value(pattern.into()), false)
    }

    #[must_use]
    pub fn not_like(self, pattern: impl Into<Value>) -> Self {
        self.set(Operator::Like, Operand::Value(pattern.into()), true)
    }

    #[must_use]
    pub fn in_range(self, range: Range) -> Self {
        self.set(Operator::Range, Operand::Range(range), false)
    }

    #[must_use]
    pub fn not_in_range(self, range: Range) -> Self {
        self.set(Operator::Range, Operand::Range(range), true)
    }

    /// Flips the negation of the last node.
    #[must_use]
    pub fn not(mut self) -> Self {
        let tail = self.tail_mut();
        tail.negated = !tail.negated;
        self
    }

    fn push(mut self, connective: Connective, node: ConditionNode) -> Self {
        self.links.push((connective, node));
        self
    }

    fn tail_column(&self) -> Option<String> {
        self.tail().column.clone()
    }

    /// Appends a node on the same column, joined with `AND`.
    #[must_use]
    pub fn and(self) -> Self {
        let column = self.tail_column();
        self.push(Connective::And, ConditionNode::for_column(column))
    }

    /// Appends a node on the same column, joined with `OR`.
    #[must_use]
    pub fn or(self) -> Self {
        let column = self.tail_column();
        self.push(Connective::Or, ConditionNode::for_column(column))
    }

    #[must_use]
    pub fn and_column(self, column: impl Into<String>) -> Self {
        self.push(Connective::And, ConditionNode::for_column(Some(column.into())))
    }

    #[must_use]
    pub fn or_column(self, column: impl Into<String>) -> Self {
        self.push(Connective::Or, ConditionNode::for_column(Some(column.into())))
    }

    #[must_use]
    pub fn and_raw(self, sql: impl Into<String>) -> Self {
        self.push(Connective::And, ConditionNode::raw(sql.into()))
    }

    #[must_use]
    pub fn or_raw(self, sql: impl Into<String>) -> Self {
        self.push(Connective::Or, ConditionNode::raw(sql.into()))
    }

    #[must_use]
    pub fn and_group(self, inner: Self) -> Self {
        self.push(Connective::And, ConditionNode::group(inner))
    }

    #[must_use]
    pub fn or_group(self, inner: Self) -> Self {
        self.push(Connective::Or, ConditionNode::group(inner))
    }

    /// Appends every node of `other`, joining its head with `connective`.
    pub fn extend(&mut self, connective: Connective, other: Self) {
        self.links.push((connective, other.head));
        self.links.extend(other.links);
    }
}

/// Deduplicates in first-seen order and drops nulls.
/// Drops nulls and repeated values, keeping first occurrences in order.
pub(crate) fn normalize_list<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut out: Vec<Value> = Vec::new();
    for value in values.into_iter().map(Into::into) {
        if !value.is_null() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
