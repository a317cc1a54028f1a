// Value: Rc-wrapped dynamic value used for query specifications and data alike

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

use crate::datetime;

/// A JSON-like value with O(1) clone semantics via Rc-wrapping.
///
/// Standard JSON types (Array, Object, String) are wrapped in Rc for cheap cloning.
/// The remaining variants cover what a query can carry besides plain JSON:
/// absence (`Undefined`), instants (`Date`), compiled patterns (`Regex`) and
/// native callables (`Predicate`).
#[derive(Clone, Debug)]
pub enum Value {
    // Standard JSON types
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<IndexMap<String, Value>>),

    // Query-level types
    Undefined,
    Date(DateTime<Utc>),
    Regex(Pattern),
    Predicate(Predicate),
}

// ── Patterns ─────────────────────────────────────────────────────────────────

/// Pattern construction errors
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    Syntax(#[from] regex::Error),

    #[error("unknown pattern flag '{0}'")]
    UnknownFlag(char),
}

/// A compiled regular expression together with the flags it was built from.
#[derive(Clone)]
pub struct Pattern {
    regex: Rc<Regex>,
    flags: Rc<str>,
}

impl Pattern {
    /// Compile `source` with JavaScript-style flags (`i`, `m`, `s`, `x`).
    ///
    /// `g` and `u` are accepted and ignored: matching is always unicode-aware
    /// and a test never depends on match position.
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'g' | 'u' => {}
                other => return Err(PatternError::UnknownFlag(other)),
            }
        }
        Ok(Pattern {
            regex: Rc::new(builder.build()?),
            flags: flags.into(),
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    #[inline]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source() && self.flags == other.flags
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source(), self.flags)
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    /// Parse either a bare pattern or a `/source/flags` literal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix('/') {
            if let Some(end) = rest.rfind('/') {
                return Pattern::new(&rest[..end], &rest[end + 1..]);
            }
        }
        Pattern::new(s, "")
    }
}

// ── Predicates ───────────────────────────────────────────────────────────────

/// A native callable usable as a `$where` or `$eq` operand.
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn(&Value) -> bool>);

impl Predicate {
    pub fn new(f: impl Fn(&Value) -> bool + 'static) -> Self {
        Predicate(Rc::new(f))
    }

    #[inline]
    pub fn call(&self, value: &Value) -> bool {
        (self.0)(value)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Predicate) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

// ── Runtime types ($type) ────────────────────────────────────────────────────

/// Runtime type of a present value, as named by `$type` operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Bool,
    Array,
    Object,
    Date,
    Regex,
    Function,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Date => "date",
            ValueType::Regex => "regex",
            ValueType::Function => "function",
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "number" => Ok(ValueType::Number),
            "bool" | "boolean" => Ok(ValueType::Bool),
            "array" => Ok(ValueType::Array),
            "object" => Ok(ValueType::Object),
            "date" => Ok(ValueType::Date),
            "regex" | "regexp" => Ok(ValueType::Regex),
            "function" | "predicate" => Ok(ValueType::Function),
            other => Err(format!("unknown type name '{}'", other)),
        }
    }
}

// ── Type checks ──────────────────────────────────────────────────────────────

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Null or absent: the two values `$exists` treats as missing.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    #[inline]
    pub fn is_regex(&self) -> bool {
        matches!(self, Value::Regex(_))
    }

    #[inline]
    pub fn is_predicate(&self) -> bool {
        matches!(self, Value::Predicate(_))
    }

    /// JavaScript-style truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The runtime type of a present value; `None` for null and absent values.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null | Value::Undefined => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Number(_) => Some(ValueType::Number),
            Value::String(_) => Some(ValueType::String),
            Value::Array(_) => Some(ValueType::Array),
            Value::Object(_) => Some(ValueType::Object),
            Value::Date(_) => Some(ValueType::Date),
            Value::Regex(_) => Some(ValueType::Regex),
            Value::Predicate(_) => Some(ValueType::Function),
        }
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

impl Value {
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => {
                let f = *n;
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    /// Index into an object by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Index into an array by position.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }

    /// Length of sized values (arrays and strings, in characters).
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Array(arr) => Some(arr.len()),
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

impl Value {
    #[inline]
    pub fn from_i64(n: i64) -> Self {
        Value::Number(n as f64)
    }

    #[inline]
    pub fn from_f64(n: f64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    #[inline]
    pub fn array(v: Vec<Value>) -> Self {
        Value::Array(Rc::new(v))
    }

    #[inline]
    pub fn object(m: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(m))
    }

    /// Single-entry object, the building block of nested dot-path clauses.
    pub fn singleton(key: impl Into<String>, value: Value) -> Self {
        let mut map = IndexMap::with_capacity(1);
        map.insert(key.into(), value);
        Value::Object(Rc::new(map))
    }

    #[inline]
    pub fn date(dt: DateTime<Utc>) -> Self {
        Value::Date(dt)
    }

    /// Build a date from milliseconds since the Unix epoch.
    pub fn date_from_millis(millis: i64) -> Option<Self> {
        datetime::from_epoch_millis(millis).map(Value::Date)
    }

    /// Compile a pattern value.
    pub fn regex(source: &str, flags: &str) -> Result<Self, PatternError> {
        Pattern::new(source, flags).map(Value::Regex)
    }

    pub fn predicate(f: impl Fn(&Value) -> bool + 'static) -> Self {
        Value::Predicate(Predicate::new(f))
    }
}

// ── From impls ───────────────────────────────────────────────────────────────

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    #[inline]
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Rc<str>> for Value {
    #[inline]
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(v: Vec<Value>) -> Self {
        Value::Array(Rc::new(v))
    }
}

impl From<IndexMap<String, Value>> for Value {
    #[inline]
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(m))
    }
}

impl From<DateTime<Utc>> for Value {
    #[inline]
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Date(dt)
    }
}

impl From<Pattern> for Value {
    #[inline]
    fn from(p: Pattern) -> Self {
        Value::Regex(p)
    }
}

impl From<Predicate> for Value {
    #[inline]
    fn from(p: Predicate) -> Self {
        Value::Predicate(p)
    }
}

// ── PartialEq ────────────────────────────────────────────────────────────────

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN != NaN falls out of f64 equality
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Predicate(a), Value::Predicate(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => write!(f, "\"{}\"", escape_json_string(s)),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", escape_json_string(k), v)?;
                }
                write!(f, "}}")
            }
            Value::Date(dt) => write!(f, "\"{}\"", datetime::format_iso8601(dt)),
            Value::Regex(p) => write!(f, "\"/{}/{}\"", escape_json_string(p.source()), p.flags()),
            Value::Predicate(_) => write!(f, "\"<predicate>\""),
        }
    }
}

fn escape_json_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c < '\x20' => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !n.is_finite() {
        // NaN and +/-Infinity serialize as null (matching JSON spec)
        write!(f, "null")
    } else if n.fract() == 0.0 && n.abs() < 9.0e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

// ── Serialization ────────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Undefined | Value::Predicate(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.is_nan() || n.is_infinite() {
                    serializer.serialize_none()
                } else if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for v in arr.iter() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
            Value::Date(dt) => serializer.serialize_str(&datetime::format_iso8601(dt)),
            Value::Regex(p) => {
                let mut m = serializer.serialize_map(Some(2))?;
                m.serialize_entry("pattern", p.source())?;
                m.serialize_entry("flags", p.flags())?;
                m.end()
            }
        }
    }
}

// ── Deserialization (single-pass JSON→Value) ─────────────────────────────────

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "any valid JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::string(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v.into()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elem) = seq.next_element()? {
            vec.push(elem);
        }
        Ok(Value::array(vec))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut m = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry()? {
            m.insert(k, v);
        }
        Ok(Value::object(m))
    }
}

// ── JSON string I/O ──────────────────────────────────────────────────────────

impl Value {
    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a JSON string into a Value (single-pass, no intermediate serde_json::Value).
    pub fn from_json_str(s: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// ── Conversion from serde_json::Value ────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(arr) => {
                Value::Array(Rc::new(arr.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => {
                let m: IndexMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Object(Rc::new(m))
            }
        }
    }
}

// ── Conversion to serde_json::Value ──────────────────────────────────────────

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null | Value::Undefined | Value::Predicate(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.is_nan() || n.is_infinite() {
                    serde_json::Value::Null
                } else {
                    serde_json::json!(*n)
                }
            }
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => {
                let m: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect();
                serde_json::Value::Object(m)
            }
            Value::Date(dt) => serde_json::Value::String(datetime::format_iso8601(dt)),
            Value::Regex(p) => serde_json::json!({
                "pattern": p.source(),
                "flags": p.flags(),
            }),
        }
    }
}

// ── value! macro ─────────────────────────────────────────────────────────────

/// Macro for constructing Value literals, similar to serde_json::json!
///
/// Usage:
///   value!(null)            → Value::Null
///   value!(true)            → Value::Bool(true)
///   value!(42)              → Value::Number(42.0)
///   value!("hello")         → Value::String(Rc::from("hello"))
///   value!([1, 2, 3])       → Value::Array(Rc::new(vec![...]))
///   value!({"k": v, ...})   → Value::Object(Rc::new(IndexMap from pairs))
///   value!(expr)            → Value::from(expr)
///
/// Negative numbers and other multi-token expressions need parentheses
/// inside arrays and objects: `value!({"n": (-1)})`.
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::value::Value::Null
    };

    (true) => {
        $crate::value::Value::Bool(true)
    };

    (false) => {
        $crate::value::Value::Bool(false)
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::value::Value::Array(std::rc::Rc::new(vec![ $( $crate::value!($elem) ),* ]))
    };

    ({ $($key:tt : $val:tt),* $(,)? }) => {
        {
            #[allow(unused_mut)]
            let mut map = $crate::indexmap::IndexMap::new();
            $(
                map.insert(($key).to_string(), $crate::value!($val));
            )*
            $crate::value::Value::Object(std::rc::Rc::new(map))
        }
    };

    ($other:expr) => {
        $crate::value::Value::from($other)
    };
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_cheap() {
        let arr = Value::array(vec![Value::from(1i64), Value::from(2i64)]);
        let arr2 = arr.clone();
        if let (Value::Array(a), Value::Array(b)) = (&arr, &arr2) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected arrays");
        }

        let s = Value::string("hello");
        let s2 = s.clone();
        if let (Value::String(a), Value::String(b)) = (&s, &s2) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected strings");
        }
    }

    #[test]
    fn test_type_checks() {
        assert!(Value::Null.is_null());
        assert!(Value::Undefined.is_undefined());
        assert!(Value::Null.is_nullish());
        assert!(Value::Undefined.is_nullish());
        assert!(!Value::Bool(false).is_nullish());
        assert!(Value::Number(42.0).is_number());
        assert!(Value::string("hello").is_string());
        assert!(Value::array(vec![]).is_array());
        assert!(Value::object(IndexMap::new()).is_object());
        assert!(Value::regex("a+", "i").unwrap().is_regex());
        assert!(Value::predicate(|_| true).is_predicate());
        assert!(Value::date_from_millis(0).unwrap().is_date());
    }

    #[test]
    fn test_value_type() {
        assert_eq!(Value::Null.value_type(), None);
        assert_eq!(Value::Undefined.value_type(), None);
        assert_eq!(Value::from("x").value_type(), Some(ValueType::String));
        assert_eq!(Value::from(1i64).value_type(), Some(ValueType::Number));
        assert_eq!(Value::predicate(|_| true).value_type(), Some(ValueType::Function));
        assert_eq!("boolean".parse::<ValueType>(), Ok(ValueType::Bool));
        assert!("integer".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::Number(1.0).is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_pattern_flags() {
        let p = Pattern::new("^ab", "i").unwrap();
        assert!(p.is_match("ABC"));
        assert_eq!(p.flags(), "i");
        assert!(matches!(Pattern::new("a", "q"), Err(PatternError::UnknownFlag('q'))));
        assert!(matches!(Pattern::new("(", ""), Err(PatternError::Syntax(_))));
    }

    #[test]
    fn test_pattern_literal_parsing() {
        let p: Pattern = "/^foo$/i".parse().unwrap();
        assert_eq!(p.source(), "^foo$");
        assert!(p.is_match("FOO"));

        let bare: Pattern = "foo".parse().unwrap();
        assert_eq!(bare.flags(), "");
    }

    #[test]
    fn test_len() {
        assert_eq!(Value::string("héllo").length(), Some(5));
        assert_eq!(value!([1, 2]).length(), Some(2));
        assert_eq!(Value::from(3i64).length(), None);
    }

    #[test]
    fn test_value_macro() {
        assert!(value!(null).is_null());
        assert_eq!(value!(true).as_bool(), Some(true));
        assert_eq!(value!([1i64, 2i64, 3i64]).as_array().map(|a| a.len()), Some(3));

        let obj = value!({"name": "Alice", "age": 30i64, "n": (-1)});
        assert_eq!(obj.get("name").and_then(|v| v.as_str()), Some("Alice"));
        assert_eq!(obj.get("n").and_then(|v| v.as_i64()), Some(-1));
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::from(1i64), Value::from("1"));

        let p = Predicate::new(|_| true);
        assert_eq!(Value::Predicate(p.clone()), Value::Predicate(p));
        assert_ne!(Value::predicate(|_| true), Value::predicate(|_| true));
    }

    #[test]
    fn test_serde_roundtrip() {
        let v = value!({"name": "Alice", "scores": [1i64, 2i64, 3i64], "active": true});
        let json_str = v.to_json_string().unwrap();
        let parsed = Value::from_json_str(&json_str).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn test_date_serializes_as_iso_string() {
        let v = Value::date_from_millis(0).unwrap();
        assert_eq!(v.to_json_string().unwrap(), "\"1970-01-01T00:00:00+00:00\"");
    }

    #[test]
    fn test_from_serde_json() {
        let sv = serde_json::json!({"name": "Alice", "age": 30, "scores": [1, 2, 3]});
        let v = Value::from(sv);
        assert_eq!(v.get("name").and_then(|v| v.as_str()), Some("Alice"));
        assert_eq!(v.get("age").and_then(|v| v.as_f64()), Some(30.0));
        assert_eq!(v.get("scores").and_then(|s| s.get_index(2)), Some(&Value::from(3i64)));
    }
}
