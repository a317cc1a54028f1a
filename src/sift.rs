//! Collection filtering on top of compiled statements.
//!
//! A [`Sifter`] pairs a compiled [`Statement`] with a [`Selector`] that picks
//! the part of each item the query is tested against.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::ast::Statement;
use crate::compiler::{compile, compile_with, QueryError};
use crate::registry::OperatorRegistry;
use crate::utils::{read_path, split_path};
use crate::value::Value;

/// Chooses the value a query is tested against.
#[derive(Clone, Default)]
pub enum Selector {
    /// The item itself.
    #[default]
    Identity,
    /// A dotted path into nested objects; missing paths select `Undefined`.
    Path(Vec<String>),
    /// An arbitrary projection.
    Func(Rc<dyn Fn(&Value) -> Value>),
}

impl Selector {
    pub fn path(path: &str) -> Result<Self, QueryError> {
        let segments = split_path(path)
            .ok_or_else(|| QueryError::MalformedSelector(format!("invalid path '{}'", path)))?;
        Ok(Selector::Path(segments.into_iter().map(str::to_string).collect()))
    }

    pub fn func(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Selector::Func(Rc::new(f))
    }

    pub fn select<'a>(&self, item: &'a Value) -> Cow<'a, Value> {
        match self {
            Selector::Identity => Cow::Borrowed(item),
            Selector::Path(segments) => match read_path(item, segments) {
                Some(v) => Cow::Borrowed(v),
                None => Cow::Owned(Value::Undefined),
            },
            Selector::Func(f) => Cow::Owned(f(item)),
        }
    }
}

/// Absent values select the item itself and strings are paths. Anything
/// else is rejected.
impl TryFrom<&Value> for Selector {
    type Error = QueryError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null | Value::Undefined => Ok(Selector::Identity),
            Value::String(path) => Selector::path(path),
            other => Err(QueryError::MalformedSelector(format!(
                "expected a path or nothing, got {}",
                other
            ))),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Identity => f.write_str("Identity"),
            Selector::Path(segments) => write!(f, "Path({})", segments.join(".")),
            Selector::Func(_) => f.write_str("Func(<fn>)"),
        }
    }
}

/// A compiled query bound to a selector.
#[derive(Debug, Clone)]
pub struct Sifter {
    statement: Statement,
    selector: Selector,
}

impl Sifter {
    /// Compile `query` against the default registry.
    pub fn new(query: &Value) -> Result<Self, QueryError> {
        Ok(Sifter::from_statement(compile(query)?))
    }

    pub fn with_registry(query: &Value, registry: &OperatorRegistry) -> Result<Self, QueryError> {
        Ok(Sifter::from_statement(compile_with(query, registry)?))
    }

    pub fn from_statement(statement: Statement) -> Self {
        Sifter {
            statement,
            selector: Selector::Identity,
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn test(&self, item: &Value) -> bool {
        self.statement.test(&self.selector.select(item))
    }

    /// Matching items, cloned, in input order.
    pub fn filter(&self, items: &[Value]) -> Vec<Value> {
        let matched: Vec<Value> = self.filter_iter(items).cloned().collect();
        log::trace!("sift kept {} of {} items", matched.len(), items.len());
        matched
    }

    pub fn filter_iter<'a, I>(&'a self, items: I) -> impl Iterator<Item = &'a Value> + 'a
    where
        I: IntoIterator<Item = &'a Value>,
        I::IntoIter: 'a,
    {
        items.into_iter().filter(move |item| self.test(item))
    }
}

/// Filter `items` with `query` compiled against the default registry.
pub fn sift(query: &Value, items: &[Value]) -> Result<Vec<Value>, QueryError> {
    Ok(Sifter::new(query)?.filter(items))
}

/// Like [`sift`], testing each item through `selector`.
pub fn sift_by(query: &Value, items: &[Value], selector: Selector) -> Result<Vec<Value>, QueryError> {
    Ok(Sifter::new(query)?.with_selector(selector).filter(items))
}
