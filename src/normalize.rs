// Comparability normalization
//
// Relational operators compare plain numbers, so dates collapse to epoch
// milliseconds before any comparison. Sequences normalize element-wise.

use std::borrow::Cow;

use crate::datetime;
use crate::value::Value;

/// Project `value` into its comparable form.
///
/// Borrows when nothing changes, which is the common case: only dates (or
/// sequences containing dates) allocate.
pub fn normalize(value: &Value) -> Cow<'_, Value> {
    match value {
        Value::Date(dt) => Cow::Owned(Value::from_i64(datetime::to_epoch_millis(dt))),
        Value::Array(arr) if arr.iter().any(needs_normalizing) => {
            Cow::Owned(Value::array(arr.iter().map(|v| normalize(v).into_owned()).collect()))
        }
        _ => Cow::Borrowed(value),
    }
}

/// Owned variant used at compile time, where operands are consumed anyway.
pub fn normalize_owned(value: Value) -> Value {
    if needs_normalizing(&value) {
        normalize(&value).into_owned()
    } else {
        value
    }
}

fn needs_normalizing(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Array(arr) => arr.iter().any(needs_normalizing),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn test_date_becomes_millis() {
        let d = Value::date_from_millis(86_400_000).unwrap();
        assert_eq!(*normalize(&d), Value::from(86_400_000i64));
    }

    #[test]
    fn test_plain_values_are_borrowed() {
        let v = value!({"a": [1, 2, "x"]});
        assert!(matches!(normalize(&v), Cow::Borrowed(_)));

        let arr = value!([1, [2, 3]]);
        assert!(matches!(normalize(&arr), Cow::Borrowed(_)));
    }

    #[test]
    fn test_nested_sequences_normalize() {
        let d = Value::date_from_millis(5).unwrap();
        let arr = Value::array(vec![
            Value::from(1i64),
            Value::array(vec![d.clone()]),
            d,
        ]);
        assert_eq!(*normalize(&arr), value!([1, [5], 5]));
    }

    #[test]
    fn test_objects_pass_through() {
        let d = Value::date_from_millis(5).unwrap();
        let obj = Value::singleton("at", d.clone());
        assert_eq!(normalize(&obj).get("at"), Some(&d));
    }

    #[test]
    fn test_nullish_values() {
        assert_eq!(*normalize(&Value::Undefined), Value::Undefined);
        assert_eq!(normalize_owned(Value::Null), Value::Null);
    }
}
