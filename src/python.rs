// Python bindings
//
// Exposes `compile(query)` returning a `Query` with `test(item)` and
// `filter(items, selector=None)`, plus the one-shot `sift(query, items,
// selector=None)`. Dicts, lists, scalars, `datetime`, `re.Pattern` and
// callables convert into query values; callables become predicates that
// re-enter the interpreter when evaluated.

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{timezone_utc, PyDateTime, PyDict, PyList, PyTuple};

use indexmap::IndexMap;

use crate::ast::Statement;
use crate::compiler::{self, QueryError};
use crate::datetime;
use crate::value::{Pattern, Predicate, Value};

// `re` module flag bits
const RE_IGNORECASE: i64 = 2;
const RE_MULTILINE: i64 = 8;
const RE_DOTALL: i64 = 16;
const RE_VERBOSE: i64 = 64;

/// A compiled query.
///
/// ```python
/// import jsonsift
///
/// q = jsonsift.compile({"age": {"$gt": 30}})
/// q.test({"age": 33})        # True
/// q.filter(people)           # matching items, original objects
/// ```
#[pyclass(name = "Query", unsendable)]
struct PyQuery {
    statement: Statement,
}

#[pymethods]
impl PyQuery {
    fn test(&self, py: Python, item: PyObject) -> PyResult<bool> {
        let value = python_to_value(py, &item)?;
        Ok(self.statement.test(&value))
    }

    /// Return the items that match, as the original Python objects.
    ///
    /// `selector`, when given, must be callable; the query is tested against
    /// `selector(item)`.
    #[pyo3(signature = (items, selector=None))]
    fn filter(&self, py: Python, items: PyObject, selector: Option<PyObject>) -> PyResult<PyObject> {
        filter_items(py, &self.statement, &items, selector.as_ref())
    }

    fn __repr__(&self) -> String {
        format!("Query(expressions={})", self.statement.len())
    }
}

/// Compile a query document.
///
/// Raises ValueError for unknown operators and invalid operands.
#[pyfunction]
fn compile(py: Python, query: PyObject) -> PyResult<PyQuery> {
    let query = python_to_value(py, &query)?;
    let statement = compiler::compile(&query).map_err(query_error_to_py)?;
    Ok(PyQuery { statement })
}

/// Compile `query` and filter `items` in one step.
#[pyfunction]
#[pyo3(signature = (query, items, selector=None))]
fn sift(py: Python, query: PyObject, items: PyObject, selector: Option<PyObject>) -> PyResult<PyObject> {
    let q = compile(py, query)?;
    filter_items(py, &q.statement, &items, selector.as_ref())
}

fn filter_items(
    py: Python,
    statement: &Statement,
    items: &PyObject,
    selector: Option<&PyObject>,
) -> PyResult<PyObject> {
    if let Some(sel) = selector {
        if !sel.bind(py).is_callable() {
            return Err(query_error_to_py(QueryError::MalformedSelector(
                "selector must be callable".to_string(),
            )));
        }
    }

    let out = PyList::empty(py);
    for item in items.bind(py).try_iter()? {
        let item = item?;
        let selected = match selector {
            Some(sel) => sel.call1(py, (item.clone(),))?,
            None => item.clone().unbind(),
        };
        if statement.test(&python_to_value(py, &selected)?) {
            out.append(item)?;
        }
    }
    Ok(out.unbind().into())
}

/// Convert a Python object to a query value.
///
/// - None -> Null
/// - bool, int, float, str -> scalars
/// - list, tuple -> Array
/// - dict -> Object (string keys only)
/// - datetime -> Date
/// - re.Pattern -> Regex
/// - any other callable -> Predicate
fn python_to_value(py: Python, obj: &PyObject) -> PyResult<Value> {
    if obj.is_none(py) {
        return Ok(Value::Null);
    }

    let bound = obj.bind(py);

    // bool before int: bool subclasses int
    if let Ok(b) = bound.downcast::<pyo3::types::PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if let Ok(i) = bound.extract::<i64>() {
        return Ok(Value::from_i64(i));
    }
    if let Ok(f) = bound.extract::<f64>() {
        return Ok(Value::from_f64(f));
    }
    if let Ok(s) = bound.extract::<String>() {
        return Ok(Value::from(s));
    }
    if let Ok(list) = bound.downcast::<PyList>() {
        let mut result = Vec::with_capacity(list.len());
        for item in list.iter() {
            result.push(python_to_value(py, &item.unbind())?);
        }
        return Ok(Value::array(result));
    }
    if let Ok(tuple) = bound.downcast::<PyTuple>() {
        let mut result = Vec::with_capacity(tuple.len());
        for item in tuple.iter() {
            result.push(python_to_value(py, &item.unbind())?);
        }
        return Ok(Value::array(result));
    }
    if let Ok(dict) = bound.downcast::<PyDict>() {
        let mut result = IndexMap::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let key_str = key
                .extract::<String>()
                .map_err(|_| PyTypeError::new_err("query and data keys must be strings"))?;
            result.insert(key_str, python_to_value(py, &value.unbind())?);
        }
        return Ok(Value::object(result));
    }
    if bound.is_instance_of::<PyDateTime>() {
        let iso: String = bound.call_method0("isoformat")?.extract()?;
        let dt = datetime::parse_iso8601(&iso).map_err(|e| PyValueError::new_err(e.to_string()))?;
        return Ok(Value::date(dt));
    }
    if is_pattern(py, bound)? {
        let source: String = bound.getattr("pattern")?.extract()?;
        let flags: i64 = bound.getattr("flags")?.extract()?;
        let pattern = Pattern::new(&source, &pattern_flags(flags))
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        return Ok(Value::Regex(pattern));
    }
    if bound.is_callable() {
        return Ok(Value::Predicate(python_predicate(obj.clone_ref(py))));
    }

    Err(PyTypeError::new_err(format!(
        "Cannot convert Python object to a query value: {}",
        bound.get_type().name()?
    )))
}

fn is_pattern(py: Python, obj: &Bound<'_, PyAny>) -> PyResult<bool> {
    let pattern_type = py.import("re")?.getattr("Pattern")?;
    obj.is_instance(&pattern_type)
}

fn pattern_flags(bits: i64) -> String {
    [
        (RE_IGNORECASE, 'i'),
        (RE_MULTILINE, 'm'),
        (RE_DOTALL, 's'),
        (RE_VERBOSE, 'x'),
    ]
    .iter()
    .filter(|(bit, _)| bits & bit != 0)
    .map(|(_, flag)| *flag)
    .collect()
}

/// Wrap a Python callable. Exceptions raised by the callable count as a
/// failed match.
fn python_predicate(callable: PyObject) -> Predicate {
    Predicate::new(move |value| {
        Python::with_gil(|py| {
            let result = value_to_python(py, value)
                .and_then(|arg| callable.call1(py, (arg,)))
                .and_then(|r| r.bind(py).is_truthy());
            result.unwrap_or_else(|e| {
                log::warn!("predicate raised: {}", e);
                false
            })
        })
    })
}

/// Convert a value back to Python for predicate arguments.
///
/// Dates become ISO strings, patterns their source text, predicates None.
fn value_to_python(py: Python, value: &Value) -> PyResult<PyObject> {
    match value {
        Value::Null | Value::Undefined | Value::Predicate(_) => Ok(py.None()),

        Value::Bool(b) => Ok(b.to_object(py)),

        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
                Ok((*n as i64).to_object(py))
            } else {
                Ok(n.to_object(py))
            }
        }

        Value::String(s) => Ok(s.to_object(py)),

        Value::Array(arr) => {
            let list = PyList::empty(py);
            for item in arr.iter() {
                list.append(value_to_python(py, item)?)?;
            }
            Ok(list.unbind().into())
        }

        Value::Object(obj) => {
            let dict = PyDict::new(py);
            for (key, value) in obj.iter() {
                dict.set_item(key, value_to_python(py, value)?)?;
            }
            Ok(dict.unbind().into())
        }

        Value::Date(dt) => {
            let utc = timezone_utc(py);
            let at = PyDateTime::from_timestamp(py, datetime::to_epoch_seconds(dt), Some(&utc))?;
            Ok(at.into_any().unbind())
        }

        Value::Regex(p) => Ok(p.source().to_object(py)),
    }
}

fn query_error_to_py(e: QueryError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// jsonsift Python module
#[pymodule]
fn _jsonsift(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compile, m)?)?;
    m.add_function(wrap_pyfunction!(sift, m)?)?;
    m.add_class::<PyQuery>()?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
