// Statement evaluation
//
// A datum is normalized once per statement; every expression then sees both
// the normalized candidate and the raw datum. Expressions run in order and
// the first failure short-circuits the rest.

use crate::ast::{ExprKind, Expression, Statement};
use crate::functions::{comparison, inspection, membership};
use crate::normalize::normalize;
use crate::value::Value;

impl Statement {
    /// Test a datum against the compiled query.
    pub fn test(&self, datum: &Value) -> bool {
        let candidate = normalize(datum);
        self.expressions
            .iter()
            .all(|expr| expr.matches(&candidate, datum))
    }
}

impl Expression {
    /// Test one expression. `candidate` is `raw` after normalization.
    pub fn matches(&self, candidate: &Value, raw: &Value) -> bool {
        match &self.kind {
            ExprKind::Eq(matcher) => comparison::matches(matcher, candidate, raw),
            ExprKind::Ne(matcher) => !comparison::matches(matcher, candidate, raw),
            ExprKind::Compare(relation, operand) => comparison::compare(*relation, operand, candidate),
            ExprKind::Exists(expected) => comparison::exists(*expected, candidate),
            ExprKind::Size(expected) => comparison::size(*expected, candidate),
            ExprKind::Mod { divisor, remainder } => comparison::modulo(*divisor, *remainder, candidate),

            ExprKind::In(set) => membership::any_of(set, candidate),
            ExprKind::Nin(set) => membership::none_of(set, candidate),
            ExprKind::All(set) => membership::all_of(set, candidate),

            ExprKind::Regex(pattern) => inspection::regex(pattern, raw),
            ExprKind::Where(predicate) => inspection::predicate(predicate, raw),
            ExprKind::Type(expected) => inspection::type_of(*expected, raw),

            ExprKind::And(statements) => statements.iter().all(|s| s.test(raw)),
            ExprKind::Or(statements) => statements.is_empty() || statements.iter().any(|s| s.test(raw)),
            ExprKind::Nor(statements) => !statements.iter().any(|s| s.test(raw)),
            ExprKind::Not(statement) => !statement.test(raw),
            ExprKind::Trav { field, statement } => traverse(field, statement, raw),

            ExprKind::Custom { operator, operand } => operator.evaluate(operand, candidate, raw),
        }
    }
}

/// Read `field` from `raw` and test it; over a sequence, any element may match.
///
/// Outside a sequence, missing fields and non-object data read as `Undefined`.
/// Sequence elements without the field are skipped.
fn traverse(field: &str, statement: &Statement, raw: &Value) -> bool {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get(field))
            .any(|v| statement.test(v)),
        other => test_field(field, statement, other),
    }
}

#[inline]
fn test_field(field: &str, statement: &Statement, value: &Value) -> bool {
    match value.get(field) {
        Some(v) => statement.test(v),
        None => statement.test(&Value::Undefined),
    }
}
