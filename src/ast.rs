// Compiled query tree
// A query compiles into a Statement: a conjunction of Expressions, each an
// operator bound to its prepared operand and a static cost.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::registry::{Builtin, CustomOperator};
use crate::value::{Pattern, Predicate, Value, ValueType};

/// A compiled query.
///
/// Matches a datum when every expression does. An empty statement matches
/// everything.
#[derive(Debug, Clone)]
pub struct Statement {
    pub(crate) expressions: Vec<Expression>,
    /// Field name (or operator name) the statement was compiled under, for
    /// nested statements.
    pub(crate) key: Option<String>,
}

impl Statement {
    pub(crate) fn new(expressions: Vec<Expression>, key: Option<String>) -> Self {
        Statement { expressions, key }
    }

    /// Expressions in evaluation order.
    #[inline]
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Sum of the expression costs.
    pub fn weight(&self) -> u64 {
        self.expressions
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.cost))
    }
}

/// One operator applied to its prepared operand.
#[derive(Debug, Clone)]
pub struct Expression {
    pub(crate) kind: ExprKind,
    pub(crate) cost: u64,
}

impl Expression {
    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Static estimate of evaluation cost; lower runs first.
    #[inline]
    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn operator_name(&self) -> &str {
        self.kind.operator_name()
    }

    /// Field read by a field traversal, `None` for every other operator.
    pub fn field(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Trav { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Operator variants with their prepared operands.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Eq(Matcher),
    Ne(Matcher),
    Compare(Relation, Value),
    Exists(bool),
    Size(usize),
    Mod { divisor: f64, remainder: f64 },

    In(Vec<Value>),
    Nin(Vec<Value>),
    All(Vec<Value>),

    Regex(Pattern),
    Where(Predicate),
    Type(ValueType),

    And(Vec<Statement>),
    Or(Vec<Statement>),
    Nor(Vec<Statement>),
    Not(Box<Statement>),
    /// Read `field` from the datum (element-wise over sequences) and test
    /// the nested statement against it.
    Trav {
        field: String,
        statement: Box<Statement>,
    },

    Custom {
        operator: Arc<CustomOperator>,
        operand: Operand,
    },
}

impl ExprKind {
    pub fn operator_name(&self) -> &str {
        match self {
            ExprKind::Eq(_) => Builtin::Eq.name(),
            ExprKind::Ne(_) => Builtin::Ne.name(),
            ExprKind::Compare(relation, _) => relation.builtin().name(),
            ExprKind::Exists(_) => Builtin::Exists.name(),
            ExprKind::Size(_) => Builtin::Size.name(),
            ExprKind::Mod { .. } => Builtin::Mod.name(),
            ExprKind::In(_) => Builtin::In.name(),
            ExprKind::Nin(_) => Builtin::Nin.name(),
            ExprKind::All(_) => Builtin::All.name(),
            ExprKind::Regex(_) => Builtin::Regex.name(),
            ExprKind::Where(_) => Builtin::Where.name(),
            ExprKind::Type(_) => Builtin::Type.name(),
            ExprKind::And(_) => Builtin::And.name(),
            ExprKind::Or(_) => Builtin::Or.name(),
            ExprKind::Nor(_) => Builtin::Nor.name(),
            ExprKind::Not(_) => Builtin::Not.name(),
            ExprKind::Trav { .. } => Builtin::Trav.name(),
            ExprKind::Custom { operator, .. } => operator.name(),
        }
    }
}

/// Ordering relations, read as "datum RELATION operand".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Relation {
    pub fn builtin(self) -> Builtin {
        match self {
            Relation::Lt => Builtin::Lt,
            Relation::Lte => Builtin::Lte,
            Relation::Gt => Builtin::Gt,
            Relation::Gte => Builtin::Gte,
        }
    }

    /// Whether `datum.cmp(operand) == ordering` satisfies the relation.
    #[inline]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Relation::Lt => ordering == Ordering::Less,
            Relation::Lte => ordering != Ordering::Greater,
            Relation::Gt => ordering == Ordering::Greater,
            Relation::Gte => ordering != Ordering::Less,
        }
    }
}

/// Prepared operand of `$eq` / `$ne`.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Strict, type-sensitive equality against a normalized literal.
    Literal(Value),
    /// Pattern test against string data.
    Pattern(Pattern),
    /// Arbitrary callable test.
    Predicate(Predicate),
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        match value {
            Value::Regex(p) => Matcher::Pattern(p),
            Value::Predicate(f) => Matcher::Predicate(f),
            other => Matcher::Literal(other),
        }
    }
}

/// Operand handed to a custom operator.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Prepared literal operand (non-traversable operators).
    Value(Value),
    /// Single nested query (traversable operators).
    Statement(Box<Statement>),
    /// Sequence of nested queries (traversable operators given a sequence).
    Statements(Vec<Statement>),
}

impl Operand {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Operand::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Operand::Statement(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_statements(&self) -> Option<&[Statement]> {
        match self {
            Operand::Statements(s) => Some(s),
            _ => None,
        }
    }
}
