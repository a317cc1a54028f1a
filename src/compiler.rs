//! Statement compiler: turns a query value into a [`Statement`] tree.
//!
//! Each key of a query object is resolved against an [`OperatorRegistry`].
//! Registered names become operator expressions with prepared operands; any
//! other key without the `$` prefix is a field name and compiles into a field
//! traversal holding a nested statement. Non-object queries are shorthand for
//! `{"$eq": query}`.
//!
//! After compilation the tree is reordered by static cost (see [`crate::cost`])
//! unless [`CompileOptions::reorder`] is off.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::ast::{ExprKind, Expression, Matcher, Operand, Relation, Statement};
use crate::cost;
use crate::normalize::normalize_owned;
use crate::registry::{
    default_registry, Builtin, CustomOperator, Operator, OperatorRegistry, OPERATOR_PREFIX,
};
use crate::utils::split_path;
use crate::value::{Pattern, Value, ValueType};

/// Maximum nesting depth accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Query errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown operator {0}")]
    UnknownOperator(String),

    #[error("Invalid operand for {operator}: {reason}")]
    InvalidOperand { operator: String, reason: String },

    #[error("Malformed selector: {0}")]
    MalformedSelector(String),

    #[error("Query nesting exceeds maximum depth of {0}")]
    NestingTooDeep(usize),
}

impl QueryError {
    pub(crate) fn invalid(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidOperand {
            operator: operator.into(),
            reason: reason.into(),
        }
    }
}

/// Compiler configuration.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Sort expressions by static cost after compilation.
    pub reorder: bool,
    /// Deepest statement nesting accepted before failing with
    /// [`QueryError::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            reorder: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Compiles queries against a borrowed registry.
pub struct Compiler<'r> {
    registry: &'r OperatorRegistry,
    options: CompileOptions,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Compiler {
            registry,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self, query: &Value) -> Result<Statement, QueryError> {
        let mut statement = self.compile_statement(query, None, 0)?;
        if self.options.reorder {
            statement.reorder();
        }
        log::debug!(
            "compiled query: {} top-level expressions, weight {}",
            statement.len(),
            statement.weight()
        );
        Ok(statement)
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn compile_statement(
        &self,
        query: &Value,
        key: Option<&str>,
        depth: usize,
    ) -> Result<Statement, QueryError> {
        if depth > self.options.max_depth {
            return Err(QueryError::NestingTooDeep(self.options.max_depth));
        }

        let expressions = match query {
            Value::Object(map) => map
                .iter()
                .map(|(k, clause)| self.compile_clause(k, clause, depth))
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![self.compile_clause(Builtin::Eq.name(), other, depth)?],
        };

        Ok(Statement::new(expressions, key.map(str::to_string)))
    }

    fn compile_statements(
        &self,
        operator: &str,
        clause: &Value,
        depth: usize,
    ) -> Result<Vec<Statement>, QueryError> {
        let items = clause
            .as_array()
            .ok_or_else(|| QueryError::invalid(operator, "expected a sequence of queries"))?;
        items
            .iter()
            .map(|item| self.compile_statement(item, None, depth + 1))
            .collect()
    }

    // ── Clauses ─────────────────────────────────────────────────────────

    fn resolve(&self, key: &str) -> Result<Operator, QueryError> {
        match self.registry.lookup(key) {
            Some(op) => Ok(op.clone()),
            None if key.starts_with(OPERATOR_PREFIX) => {
                Err(QueryError::UnknownOperator(key.to_string()))
            }
            None => Ok(Operator::Builtin(Builtin::Trav)),
        }
    }

    fn compile_clause(&self, key: &str, clause: &Value, depth: usize) -> Result<Expression, QueryError> {
        let kind = match self.resolve(key)? {
            Operator::Builtin(builtin) => self.compile_builtin(builtin, key, clause, depth)?,
            Operator::Custom(custom) => self.compile_custom(custom, key, clause, depth)?,
        };
        let cost = cost::weigh(&kind);
        Ok(Expression { kind, cost })
    }

    fn compile_builtin(
        &self,
        builtin: Builtin,
        key: &str,
        clause: &Value,
        depth: usize,
    ) -> Result<ExprKind, QueryError> {
        let name = builtin.name();
        let kind = match builtin {
            Builtin::Trav => {
                let (field, nested) = expand_path(key, clause)?;
                let statement = self.compile_statement(&nested, Some(&field), depth + 1)?;
                ExprKind::Trav {
                    field,
                    statement: Box::new(statement),
                }
            }
            Builtin::And => ExprKind::And(self.compile_statements(name, clause, depth)?),
            Builtin::Or => ExprKind::Or(self.compile_statements(name, clause, depth)?),
            Builtin::Nor => ExprKind::Nor(self.compile_statements(name, clause, depth)?),
            Builtin::Not => match clause {
                Value::Object(_) | Value::Regex(_) => {
                    ExprKind::Not(Box::new(self.compile_statement(clause, Some(key), depth + 1)?))
                }
                _ => {
                    return Err(QueryError::invalid(
                        name,
                        "expected a nested query or pattern; use $ne to negate a value",
                    ))
                }
            },
            _ => prepare_builtin(builtin, normalize_owned(clause.clone()))?,
        };
        Ok(kind)
    }

    fn compile_custom(
        &self,
        custom: Arc<CustomOperator>,
        key: &str,
        clause: &Value,
        depth: usize,
    ) -> Result<ExprKind, QueryError> {
        let operand = if custom.is_traversable() {
            match clause {
                Value::Array(_) => Operand::Statements(self.compile_statements(key, clause, depth)?),
                _ => Operand::Statement(Box::new(self.compile_statement(clause, Some(key), depth + 1)?)),
            }
        } else {
            Operand::Value(custom.prepare(normalize_owned(clause.clone()))?)
        };
        Ok(ExprKind::Custom {
            operator: custom,
            operand,
        })
    }
}

/// Split a dotted field key into its first segment and a nested clause.
///
/// `{"a.b.c": x}` is read as `{"a": {"b": {"c": x}}}`.
fn expand_path(key: &str, clause: &Value) -> Result<(String, Value), QueryError> {
    if !key.contains('.') {
        return Ok((key.to_string(), clause.clone()));
    }

    let segments = split_path(key).ok_or_else(|| {
        QueryError::invalid(
            Builtin::Trav.name(),
            format!("empty segment in field path '{}'", key),
        )
    })?;

    let nested = segments[1..]
        .iter()
        .rev()
        .fold(clause.clone(), |inner, segment| Value::singleton(*segment, inner));
    Ok((segments[0].to_string(), nested))
}

/// Validate and prepare the operand of a non-traversable built-in.
fn prepare_builtin(builtin: Builtin, operand: Value) -> Result<ExprKind, QueryError> {
    let name = builtin.name();
    let kind = match builtin {
        Builtin::Eq => ExprKind::Eq(Matcher::from(operand)),
        Builtin::Ne => ExprKind::Ne(Matcher::from(operand)),
        Builtin::Lt => ExprKind::Compare(Relation::Lt, operand),
        Builtin::Lte => ExprKind::Compare(Relation::Lte, operand),
        Builtin::Gt => ExprKind::Compare(Relation::Gt, operand),
        Builtin::Gte => ExprKind::Compare(Relation::Gte, operand),
        Builtin::Exists => ExprKind::Exists(operand.is_truthy()),
        Builtin::Size => ExprKind::Size(prepare_size(&operand)?),
        Builtin::Mod => {
            let (divisor, remainder) = prepare_mod(&operand)?;
            ExprKind::Mod { divisor, remainder }
        }
        Builtin::In => ExprKind::In(prepare_set(name, operand)?),
        Builtin::Nin => ExprKind::Nin(prepare_set(name, operand)?),
        Builtin::All => ExprKind::All(prepare_set(name, operand)?),
        Builtin::Regex => ExprKind::Regex(prepare_pattern(operand)?),
        Builtin::Where => match operand {
            Value::Predicate(p) => ExprKind::Where(p),
            Value::String(_) => {
                return Err(QueryError::invalid(
                    name,
                    "textual expressions are not supported; pass a predicate",
                ))
            }
            _ => return Err(QueryError::invalid(name, "expected a predicate")),
        },
        Builtin::Type => {
            let type_name = operand
                .as_str()
                .ok_or_else(|| QueryError::invalid(name, "expected a type name"))?;
            ExprKind::Type(ValueType::from_str(type_name).map_err(|e| QueryError::invalid(name, e))?)
        }
        Builtin::And | Builtin::Or | Builtin::Nor | Builtin::Not | Builtin::Trav => {
            return Err(QueryError::invalid(name, "expected nested queries"))
        }
    };
    Ok(kind)
}

fn prepare_size(operand: &Value) -> Result<usize, QueryError> {
    match operand {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && n.is_finite() => Ok(*n as usize),
        Value::Array(items) => Ok(items.len()),
        _ => Err(QueryError::invalid(
            Builtin::Size.name(),
            "expected a non-negative integer",
        )),
    }
}

fn prepare_mod(operand: &Value) -> Result<(f64, f64), QueryError> {
    let name = Builtin::Mod.name();
    let pair = operand
        .as_array()
        .filter(|items| items.len() == 2)
        .ok_or_else(|| QueryError::invalid(name, "expected [divisor, remainder]"))?;

    match (pair[0].as_f64(), pair[1].as_f64()) {
        (Some(divisor), _) if divisor == 0.0 => Err(QueryError::invalid(name, "divisor must not be zero")),
        (Some(divisor), Some(remainder)) => Ok((divisor, remainder)),
        _ => Err(QueryError::invalid(name, "divisor and remainder must be numbers")),
    }
}

fn prepare_set(operator: &str, operand: Value) -> Result<Vec<Value>, QueryError> {
    match operand {
        Value::Array(items) => Ok(items.as_ref().clone()),
        _ => Err(QueryError::invalid(operator, "expected a sequence")),
    }
}

fn prepare_pattern(operand: Value) -> Result<Pattern, QueryError> {
    let name = Builtin::Regex.name();
    match operand {
        Value::Regex(p) => Ok(p),
        Value::String(source) => {
            Pattern::new(&source, "").map_err(|e| QueryError::invalid(name, e.to_string()))
        }
        _ => Err(QueryError::invalid(name, "expected a pattern or pattern source")),
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compile `query` against the default registry.
pub fn compile(query: &Value) -> Result<Statement, QueryError> {
    Compiler::new(&default_registry()).compile(query)
}

/// Compile `query` against an explicit registry.
pub fn compile_with(query: &Value, registry: &OperatorRegistry) -> Result<Statement, QueryError> {
    Compiler::new(registry).compile(query)
}
