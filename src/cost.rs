// Cost-weighted expression ordering
//
// Every expression gets a static cost when it is compiled:
//
//   cost = class weight * 100 + operand magnitude
//
// The class weight ranks operators by how expensive they are to evaluate
// (a strict equality is cheap, a user predicate is not). The magnitude grows
// with the operand, so a long `$in` list sorts after a short one. Reordering
// sorts each statement ascending by cost; the sort is stable, so ties keep
// the order in which the keys were written. Only conjunctions and
// disjunctions are reordered, so truth values never change.

use crate::ast::{ExprKind, Matcher, Operand, Statement};
use crate::value::Value;

const CLASS_SCALE: u64 = 100;

/// Magnitude of pattern and callable operands.
const OPAQUE_MAGNITUDE: u64 = 100;

fn class_weight(kind: &ExprKind) -> u64 {
    match kind {
        ExprKind::Eq(_) => 1,
        ExprKind::Ne(_) | ExprKind::Exists(_) | ExprKind::Compare(..) => 2,
        ExprKind::Size(_) | ExprKind::Mod { .. } | ExprKind::Type(_) => 3,
        ExprKind::In(_) | ExprKind::Nin(_) => 4,
        ExprKind::All(_) | ExprKind::Regex(_) => 5,
        ExprKind::Or(_) | ExprKind::Nor(_) | ExprKind::Not(_) => 6,
        ExprKind::And(_) => 7,
        ExprKind::Trav { .. } => 8,
        ExprKind::Where(_) => 9,
        ExprKind::Custom { operator, .. } => {
            if operator.is_traversable() {
                8
            } else {
                5
            }
        }
    }
}

/// Static cost of a compiled expression.
pub(crate) fn weigh(kind: &ExprKind) -> u64 {
    class_weight(kind)
        .saturating_mul(CLASS_SCALE)
        .saturating_add(operand_magnitude(kind))
}

fn operand_magnitude(kind: &ExprKind) -> u64 {
    match kind {
        ExprKind::Eq(m) | ExprKind::Ne(m) => match m {
            Matcher::Literal(v) => magnitude(v),
            Matcher::Pattern(_) | Matcher::Predicate(_) => OPAQUE_MAGNITUDE,
        },
        ExprKind::Compare(_, v) => magnitude(v),
        ExprKind::Exists(_) | ExprKind::Type(_) => 0,
        ExprKind::Size(n) => *n as u64,
        ExprKind::Mod { divisor, remainder } => {
            number_magnitude(*divisor).saturating_add(number_magnitude(*remainder))
        }
        ExprKind::In(set) | ExprKind::Nin(set) | ExprKind::All(set) => sum(set.iter().map(magnitude)),
        ExprKind::Regex(_) | ExprKind::Where(_) => OPAQUE_MAGNITUDE,
        ExprKind::And(list) | ExprKind::Or(list) | ExprKind::Nor(list) => {
            sum(list.iter().map(Statement::weight))
        }
        ExprKind::Not(statement) | ExprKind::Trav { statement, .. } => statement.weight(),
        ExprKind::Custom { operand, .. } => match operand {
            Operand::Value(v) => magnitude(v),
            Operand::Statement(s) => s.weight(),
            Operand::Statements(list) => sum(list.iter().map(Statement::weight)),
        },
    }
}

/// Size-like measure of a literal operand.
pub fn magnitude(value: &Value) -> u64 {
    match value {
        Value::Null | Value::Undefined | Value::Bool(_) => 0,
        Value::Number(n) => number_magnitude(*n),
        Value::String(s) => s.chars().count() as u64,
        Value::Array(items) => sum(items.iter().map(magnitude)),
        Value::Object(map) => sum(map.values().map(magnitude)),
        Value::Date(_) => 0,
        Value::Regex(_) | Value::Predicate(_) => OPAQUE_MAGNITUDE,
    }
}

// `as` saturates and maps NaN to zero.
#[inline]
fn number_magnitude(n: f64) -> u64 {
    n.abs() as u64
}

#[inline]
fn sum(parts: impl Iterator<Item = u64>) -> u64 {
    parts.fold(0, u64::saturating_add)
}

impl Statement {
    /// Sort expressions ascending by cost, recursively.
    ///
    /// Applied by the compiler unless disabled; may be called again on a
    /// statement compiled without it.
    pub fn reorder(&mut self) {
        for expr in &mut self.expressions {
            match &mut expr.kind {
                ExprKind::And(list) | ExprKind::Or(list) | ExprKind::Nor(list) => {
                    for statement in list.iter_mut() {
                        statement.reorder();
                    }
                    list.sort_by_key(Statement::weight);
                }
                ExprKind::Not(statement) | ExprKind::Trav { statement, .. } => statement.reorder(),
                ExprKind::Custom { operand, .. } => match operand {
                    Operand::Statement(statement) => statement.reorder(),
                    // Custom operators may depend on list order.
                    Operand::Statements(list) => list.iter_mut().for_each(Statement::reorder),
                    Operand::Value(_) => {}
                },
                _ => {}
            }
        }
        self.expressions.sort_by_key(|e| e.cost);
        log::trace!(
            "reordered {} expressions: {:?}",
            self.expressions.len(),
            self.expressions
                .iter()
                .map(|e| (e.operator_name(), e.cost))
                .collect::<Vec<_>>()
        );
    }
}
