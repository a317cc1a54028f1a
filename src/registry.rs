// Operator registry
//
// Maps operator names to their behavior. Built-ins are a closed enum; user
// extensions are capability records held behind `Arc`, so a compiled
// statement keeps the entry it was compiled with even if the name is later
// re-registered.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard};

use crate::ast::Operand;
use crate::compiler::QueryError;
use crate::value::Value;

/// Marker that distinguishes operator keys from field paths.
pub const OPERATOR_PREFIX: char = '$';

/// Built-in operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Exists,
    Size,
    Mod,

    // Membership
    In,
    Nin,
    All,

    // Pattern / callable / type
    Regex,
    Where,
    Type,

    // Structural
    And,
    Or,
    Nor,
    Not,
    Trav,
}

impl Builtin {
    pub const ALL: [Builtin; 20] = [
        Builtin::Eq,
        Builtin::Ne,
        Builtin::Lt,
        Builtin::Gt,
        Builtin::Lte,
        Builtin::Gte,
        Builtin::Exists,
        Builtin::Size,
        Builtin::Mod,
        Builtin::In,
        Builtin::Nin,
        Builtin::All,
        Builtin::Regex,
        Builtin::Where,
        Builtin::Type,
        Builtin::And,
        Builtin::Or,
        Builtin::Nor,
        Builtin::Not,
        Builtin::Trav,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Eq => "$eq",
            Builtin::Ne => "$ne",
            Builtin::Lt => "$lt",
            Builtin::Gt => "$gt",
            Builtin::Lte => "$lte",
            Builtin::Gte => "$gte",
            Builtin::Exists => "$exists",
            Builtin::Size => "$size",
            Builtin::Mod => "$mod",
            Builtin::In => "$in",
            Builtin::Nin => "$nin",
            Builtin::All => "$all",
            Builtin::Regex => "$regex",
            Builtin::Where => "$where",
            Builtin::Type => "$type",
            Builtin::And => "$and",
            Builtin::Or => "$or",
            Builtin::Nor => "$nor",
            Builtin::Not => "$not",
            Builtin::Trav => "$trav",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Operators whose operand is one or more nested queries.
    #[inline]
    pub fn is_traversable(self) -> bool {
        matches!(
            self,
            Builtin::And | Builtin::Or | Builtin::Nor | Builtin::Not | Builtin::Trav
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluation function of a custom operator: `(operand, candidate, raw datum)`.
///
/// `candidate` is the normalized datum (dates as epoch milliseconds), `raw`
/// the datum as given.
pub type EvaluateFn = dyn Fn(&Operand, &Value, &Value) -> bool + Send + Sync;

/// Compile-time operand preparation of a custom operator.
pub type PrepareFn = dyn Fn(Value) -> Result<Value, QueryError> + Send + Sync;

/// A user-registered operator.
pub struct CustomOperator {
    name: String,
    evaluate: Arc<EvaluateFn>,
    prepare: Option<Arc<PrepareFn>>,
    traversable: bool,
}

impl CustomOperator {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_traversable(&self) -> bool {
        self.traversable
    }

    #[inline]
    pub fn evaluate(&self, operand: &Operand, candidate: &Value, raw: &Value) -> bool {
        (self.evaluate)(operand, candidate, raw)
    }

    /// Run the prepare step, if any.
    pub fn prepare(&self, operand: Value) -> Result<Value, QueryError> {
        match &self.prepare {
            Some(prepare) => prepare(operand),
            None => Ok(operand),
        }
    }
}

impl fmt::Debug for CustomOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOperator")
            .field("name", &self.name)
            .field("traversable", &self.traversable)
            .field("prepare", &self.prepare.is_some())
            .finish()
    }
}

/// A registry entry.
#[derive(Clone, Debug)]
pub enum Operator {
    Builtin(Builtin),
    Custom(Arc<CustomOperator>),
}

impl Operator {
    pub fn name(&self) -> &str {
        match self {
            Operator::Builtin(b) => b.name(),
            Operator::Custom(c) => c.name(),
        }
    }

    pub fn is_traversable(&self) -> bool {
        match self {
            Operator::Builtin(b) => b.is_traversable(),
            Operator::Custom(c) => c.is_traversable(),
        }
    }
}

/// Options accepted by [`OperatorRegistry::register`].
#[derive(Clone, Default)]
pub struct OperatorOptions {
    /// The operand is one or more nested queries rather than a literal.
    pub traversable: bool,
    /// Applied to the (normalized) operand at compile time.
    pub prepare: Option<Arc<PrepareFn>>,
}

impl OperatorOptions {
    pub fn traversable() -> Self {
        OperatorOptions {
            traversable: true,
            prepare: None,
        }
    }

    pub fn with_prepare(
        mut self,
        prepare: impl Fn(Value) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        self.prepare = Some(Arc::new(prepare));
        self
    }
}

/// Name → operator mapping consulted by the compiler.
#[derive(Clone, Debug)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl OperatorRegistry {
    /// A registry seeded with every built-in operator.
    pub fn new() -> Self {
        let operators = Builtin::ALL
            .into_iter()
            .map(|b| (b.name().to_string(), Operator::Builtin(b)))
            .collect();
        OperatorRegistry { operators }
    }

    /// A registry with no operators at all.
    pub fn empty() -> Self {
        OperatorRegistry {
            operators: HashMap::new(),
        }
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Add or replace an operator.
    ///
    /// `name` may be given with or without the `$` prefix. Statements compiled
    /// earlier keep the operator they captured.
    pub fn register(
        &mut self,
        name: &str,
        evaluate: impl Fn(&Operand, &Value, &Value) -> bool + Send + Sync + 'static,
        options: OperatorOptions,
    ) {
        let name = canonical_name(name);
        let operator = Operator::Custom(Arc::new(CustomOperator {
            name: name.clone(),
            evaluate: Arc::new(evaluate),
            prepare: options.prepare,
            traversable: options.traversable,
        }));
        if self.operators.insert(name.clone(), operator).is_some() {
            log::debug!("operator {} replaced", name);
        } else {
            log::debug!("operator {} registered", name);
        }
    }

    /// Restore a built-in under its own name (after it was overridden or removed).
    pub fn register_builtin(&mut self, builtin: Builtin) {
        self.operators
            .insert(builtin.name().to_string(), Operator::Builtin(builtin));
    }

    pub fn unregister(&mut self, name: &str) -> Option<Operator> {
        self.operators.remove(&canonical_name(name))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_name(name: &str) -> String {
    if name.starts_with(OPERATOR_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", OPERATOR_PREFIX, name)
    }
}

// ---------------------------------------------------------------------------
// Process-wide default registry
// ---------------------------------------------------------------------------

static DEFAULT_REGISTRY: LazyLock<RwLock<OperatorRegistry>> =
    LazyLock::new(|| RwLock::new(OperatorRegistry::new()));

/// Read access to the default registry used by [`crate::compile`].
///
/// Do not call [`register_operator`] while holding the guard.
pub fn default_registry() -> RwLockReadGuard<'static, OperatorRegistry> {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Register an operator in the default registry.
pub fn register_operator(
    name: &str,
    evaluate: impl Fn(&Operand, &Value, &Value) -> bool + Send + Sync + 'static,
    options: OperatorOptions,
) {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, evaluate, options);
}
