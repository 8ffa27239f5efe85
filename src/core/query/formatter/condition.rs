// src/core/query/formatter/condition.rs
//! Rendering of condition chains.

use tracing::trace;

use super::Formatter;
use crate::core::common::types::Value;
use crate::core::query::condition::{normalize_list, Condition, ConditionNode, Connective, Operand, Operator};
use crate::core::query::errors::CompileError;

/// Rendered SQL for part of a `WHERE` clause with the bindings of its
/// placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub bindings: Vec<Value>,
    /// Set when the text contains a top-level `AND`/`OR` and needs
    /// parentheses next to other predicates.
    compound: bool,
}

impl Fragment {
    fn new(sql: String, bindings: Vec<Value>) -> Self {
        Self { sql, bindings, compound: false }
    }

    fn compound(sql: String, bindings: Vec<Value>) -> Self {
        Self { sql, bindings, compound: true }
    }

    #[must_use]
    pub const fn is_compound(&self) -> bool {
        self.compound
    }
}

/// Joins fragments with their connectives; a single fragment is returned
/// untouched and several are wrapped in one pair of parentheses.
fn join(parts: Vec<(Option<Connective>, Fragment)>, parenthesize: bool) -> Fragment {
    if parts.len() == 1 {
        if let Some((_, only)) = parts.into_iter().next() {
            return only;
        }
        return Fragment::new(String::new(), Vec::new());
    }

    let mut sql = String::new();
    let mut bindings = Vec::new();
    for (connective, part) in parts {
        if let Some(connective) = connective {
            sql.push(' ');
            sql.push_str(connective.as_str());
            sql.push(' ');
        }
        if part.compound {
            sql.push('(');
            sql.push_str(&part.sql);
            sql.push(')');
        } else {
            sql.push_str(&part.sql);
        }
        bindings.extend(part.bindings);
    }

    if parenthesize {
        Fragment::new(format!("({sql})"), bindings)
    } else {
        Fragment::compound(sql, bindings)
    }
}

/// Renders a chain; parenthesized only when it has more than one node.
pub fn chain<F: Formatter + ?Sized>(f: &F, condition: &Condition) -> Result<Fragment, CompileError> {
    let parts = condition
        .nodes()
        .map(|(connective, node)| segment(f, node).map(|fragment| (connective, fragment)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join(parts, true))
}

/// Renders the top-level predicates of a statement, implicitly `AND`-ed.
///
/// # Errors
/// Returns `CompileError` if any chain cannot be rendered.
pub fn where_expr<F: Formatter + ?Sized>(
    f: &F,
    conditions: &[Condition],
) -> Result<Option<Fragment>, CompileError> {
    if conditions.is_empty() {
        return Ok(None);
    }
    let parts = conditions
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let connective = (i > 0).then_some(Connective::And);
            f.condition_expr(c).map(|fragment| (connective, fragment))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(join(parts, false)))
}

/// Renders one node.
fn segment<F: Formatter + ?Sized>(f: &F, node: &ConditionNode) -> Result<Fragment, CompileError> {
    match node.operand() {
        Operand::Group(inner) => {
            let rendered = chain(f, inner)?;
            if !node.is_negated() {
                return Ok(rendered);
            }
            let sql = if inner.len() > 1 {
                format!("NOT {}", rendered.sql)
            } else {
                format!("NOT ({})", rendered.sql)
            };
            Ok(Fragment::new(sql, rendered.bindings))
        }
        Operand::Raw(sql) if node.column().is_none() => {
            if node.is_negated() {
                return Err(CompileError::NonNegatable(Operator::Raw));
            }
            Ok(Fragment::new(sql.clone(), Vec::new()))
        }
        _ => predicate(f, node),
    }
}

fn predicate<F: Formatter + ?Sized>(f: &F, node: &ConditionNode) -> Result<Fragment, CompileError> {
    let column = node.column().unwrap_or_default();
    let Some(operator) = node.operator() else {
        return Err(CompileError::IncompleteCondition(column.to_string()));
    };
    if column.is_empty() {
        return Err(CompileError::IncompleteCondition(column.to_string()));
    }

    let (operator, inherent) = operator.positive();
    let negated = node.is_negated() != inherent;
    let col = f.quote_identifier(column);
    trace!(column, %operator, negated, "rendering condition node");

    match operator {
        Operator::Equals => {
            let value = single(operator, node.operand())?;
            if value.is_null() {
                let test = if negated { "IS NOT NULL" } else { "IS NULL" };
                return Ok(Fragment::new(format!("{col} {test}"), Vec::new()));
            }
            let op = if negated { "!=" } else { "=" };
            Ok(Fragment::new(format!("{col} {op} ?"), vec![value.clone()]))
        }
        Operator::LessThan | Operator::LessOrEqual | Operator::GreaterThan | Operator::GreaterOrEqual => {
            if negated {
                return Err(CompileError::NonNegatable(operator));
            }
            let value = single(operator, node.operand())?;
            Ok(Fragment::new(format!("{col} {} ?", operator.as_str()), vec![value.clone()]))
        }
        Operator::In => {
            let values: Vec<Value> = match node.operand() {
                Operand::List(values) => normalize_list(values.iter().cloned()),
                Operand::Value(Value::Null) => Vec::new(),
                Operand::Value(value) => vec![value.clone()],
                _ => {
                    return Err(CompileError::InvalidOperand { operator, expected: "a list of values" })
                }
            };
            if values.is_empty() {
                return Ok(Fragment::new("1 = 0".to_string(), Vec::new()));
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            let not = if negated { "NOT " } else { "" };
            Ok(Fragment::new(format!("{col} {not}IN ({placeholders})"), values))
        }
        Operator::Between => {
            let Operand::List(values) = node.operand() else {
                return Err(CompileError::InvalidOperand { operator, expected: "two values" });
            };
            match values.len() {
                2 => {
                    let not = if negated { "NOT " } else { "" };
                    Ok(Fragment::new(format!("{col} {not}BETWEEN ? AND ?"), values.clone()))
                }
                n if n > 2 => Err(CompileError::TooManyParameters(n)),
                n => Err(CompileError::MissingParameters { operator, expected: 2, found: n }),
            }
        }
        Operator::Like => {
            let value = single(operator, node.operand())?;
            let not = if negated { "NOT " } else { "" };
            Ok(Fragment::new(format!("{col} {not}LIKE ?"), vec![value.clone()]))
        }
        Operator::Range => {
            let Operand::Range(range) = node.operand() else {
                return Err(CompileError::InvalidOperand { operator, expected: "a range" });
            };
            let (lower_op, upper_op) = range.bound_operators(negated);
            let joiner = if negated { Connective::Or } else { Connective::And };
            Ok(Fragment::compound(
                format!("{col} {lower_op} ? {} {col} {upper_op} ?", joiner.as_str()),
                vec![range.lower().clone(), range.upper().clone()],
            ))
        }
        Operator::Raw => Err(CompileError::InvalidOperand { operator, expected: "no column" }),
        Operator::NotEquals | Operator::NotIn | Operator::NotBetween | Operator::NotLike => {
            // positive() never yields a negative variant
            Err(CompileError::NonNegatable(operator))
        }
    }
}

/// The one value an operator expects. A one-element list is accepted.
fn single(operator: Operator, operand: &Operand) -> Result<&Value, CompileError> {
    match operand {
        Operand::Value(value) => Ok(value),
        Operand::List(values) => match values.as_slice() {
            [value] => Ok(value),
            [] => Err(CompileError::MissingParameters { operator, expected: 1, found: 0 }),
            many => Err(CompileError::TooManyParameters(many.len())),
        },
        Operand::None | Operand::Range(_) | Operand::Group(_) | Operand::Raw(_) => {
            Err(CompileError::InvalidOperand { operator, expected: "a single value" })
        }
    }
}
