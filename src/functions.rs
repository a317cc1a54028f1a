// Built-in operator tests
//
// Each function answers one operator for one datum. `candidate` is the
// normalized datum, `raw` the datum as given. Sequence data is matched
// existentially unless noted otherwise.

use crate::ast::{Matcher, Relation};
use crate::value::Value;

/// Equality and ordering tests
pub mod comparison {
    use super::*;

    /// `$eq`: literal equality, pattern or predicate.
    ///
    /// A literal matches a sequence datum when any element equals it or the
    /// whole sequence does.
    pub fn matches(matcher: &Matcher, candidate: &Value, raw: &Value) -> bool {
        match matcher {
            Matcher::Literal(expected) => match candidate {
                Value::Array(items) => candidate == expected || items.iter().any(|item| item == expected),
                other => other == expected,
            },
            Matcher::Pattern(pattern) => match raw {
                Value::String(s) => pattern.is_match(s),
                Value::Array(items) => items
                    .iter()
                    .any(|item| item.as_str().is_some_and(|s| pattern.is_match(s))),
                _ => false,
            },
            Matcher::Predicate(predicate) => predicate.call(raw),
        }
    }

    /// `$lt`, `$lte`, `$gt`, `$gte`.
    ///
    /// Only numbers, strings and booleans are ordered, each against its own
    /// kind; anything else fails the test.
    pub fn compare(relation: Relation, operand: &Value, candidate: &Value) -> bool {
        match candidate {
            Value::Array(items) => items.iter().any(|item| compare_one(relation, operand, item)),
            other => compare_one(relation, operand, other),
        }
    }

    fn compare_one(relation: Relation, operand: &Value, candidate: &Value) -> bool {
        let ordering = match (candidate, operand) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        };
        ordering.is_some_and(|o| relation.holds(o))
    }

    /// `$exists`
    #[inline]
    pub fn exists(expected: bool, candidate: &Value) -> bool {
        expected == !candidate.is_nullish()
    }

    /// `$size`: sequence length or string character count.
    #[inline]
    pub fn size(expected: usize, candidate: &Value) -> bool {
        candidate.length() == Some(expected)
    }

    /// `$mod`
    pub fn modulo(divisor: f64, remainder: f64, candidate: &Value) -> bool {
        match candidate {
            Value::Number(n) => n % divisor == remainder,
            Value::Array(items) => items.iter().any(|item| modulo(divisor, remainder, item)),
            _ => false,
        }
    }
}

/// Set membership tests
pub mod membership {
    use super::*;

    /// `$in`: some element of `set` matches the datum (or one of its elements).
    pub fn any_of(set: &[Value], candidate: &Value) -> bool {
        match candidate {
            Value::Array(items) => {
                set.iter().any(|member| member == candidate)
                    || items.iter().any(|item| contains(set, item))
            }
            other => contains(set, other),
        }
    }

    /// `$nin`
    #[inline]
    pub fn none_of(set: &[Value], candidate: &Value) -> bool {
        !any_of(set, candidate)
    }

    /// `$all`: every element of `set` is present in the datum. A scalar datum
    /// acts as a one-element sequence; absent data never match.
    pub fn all_of(set: &[Value], candidate: &Value) -> bool {
        match candidate {
            Value::Null | Value::Undefined => false,
            Value::Array(items) => set
                .iter()
                .all(|member| items.iter().any(|item| member_matches(member, item))),
            other => set.iter().all(|member| member_matches(member, other)),
        }
    }

    fn contains(set: &[Value], value: &Value) -> bool {
        set.iter().any(|member| member_matches(member, value))
    }

    /// Pattern members test strings; everything else compares strictly.
    fn member_matches(member: &Value, value: &Value) -> bool {
        match (member, value) {
            (Value::Regex(pattern), Value::String(s)) => pattern.is_match(s),
            (Value::Regex(_), _) => false,
            _ => member == value,
        }
    }
}

/// Pattern, callable and type tests. These read the raw datum.
pub mod inspection {
    use super::*;
    use crate::value::{Pattern, Predicate, ValueType};

    /// `$regex`
    pub fn regex(pattern: &Pattern, raw: &Value) -> bool {
        match raw {
            Value::String(s) => pattern.is_match(s),
            Value::Array(items) => items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| pattern.is_match(s))),
            _ => false,
        }
    }

    /// `$where`
    #[inline]
    pub fn predicate(predicate: &Predicate, raw: &Value) -> bool {
        predicate.call(raw)
    }

    /// `$type`: null and absent data have no type.
    #[inline]
    pub fn type_of(expected: ValueType, raw: &Value) -> bool {
        raw.value_type() == Some(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use crate::value::{Pattern, Predicate, ValueType};

    fn literal(v: Value) -> Matcher {
        Matcher::Literal(v)
    }

    #[test]
    fn test_literal_equality_is_strict() {
        let one = literal(value!(1));
        assert!(comparison::matches(&one, &value!(1), &value!(1)));
        assert!(!comparison::matches(&one, &value!("1"), &value!("1")));
        assert!(!comparison::matches(&one, &value!(true), &value!(true)));

        let null = literal(Value::Null);
        assert!(comparison::matches(&null, &Value::Null, &Value::Null));
        assert!(!comparison::matches(&null, &Value::Undefined, &Value::Undefined));
    }

    #[test]
    fn test_literal_equality_on_sequences() {
        let tags = value!(["a", "b"]);
        assert!(comparison::matches(&literal(value!("b")), &tags, &tags));
        assert!(comparison::matches(&literal(value!(["a", "b"])), &tags, &tags));
        assert!(!comparison::matches(&literal(value!(["b", "a"])), &tags, &tags));
        assert!(!comparison::matches(&literal(value!("c")), &tags, &tags));
    }

    #[test]
    fn test_pattern_equality() {
        let m = Matcher::Pattern(Pattern::new("^ja", "i").unwrap());
        assert!(comparison::matches(&m, &value!("Jack"), &value!("Jack")));
        assert!(comparison::matches(&m, &value!(["x", "jan"]), &value!(["x", "jan"])));
        assert!(!comparison::matches(&m, &value!(5), &value!(5)));
        assert!(!comparison::matches(&m, &Value::Null, &Value::Null));
    }

    #[test]
    fn test_predicate_sees_raw_datum() {
        let m = Matcher::Predicate(Predicate::new(|v| v.is_date()));
        let d = Value::date_from_millis(0).unwrap();
        assert!(comparison::matches(&m, &value!(0), &d));
    }

    #[test]
    fn test_ordering() {
        assert!(comparison::compare(Relation::Gt, &value!(5), &value!(6)));
        assert!(!comparison::compare(Relation::Gt, &value!(5), &value!(5)));
        assert!(comparison::compare(Relation::Gte, &value!(5), &value!(5)));
        assert!(comparison::compare(Relation::Lt, &value!("b"), &value!("a")));
        assert!(comparison::compare(Relation::Lte, &value!(true), &value!(false)));
    }

    #[test]
    fn test_ordering_mixed_kinds_fail() {
        assert!(!comparison::compare(Relation::Lt, &value!(5), &value!("1")));
        assert!(!comparison::compare(Relation::Gt, &value!("5"), &value!(9)));
        assert!(!comparison::compare(Relation::Lt, &value!(5), &Value::Null));
        assert!(!comparison::compare(Relation::Lt, &value!(5), &Value::Undefined));
        assert!(!comparison::compare(Relation::Gt, &value!(5), &value!(f64::NAN)));
    }

    #[test]
    fn test_ordering_on_sequences() {
        let xs = value!([1, 8]);
        assert!(comparison::compare(Relation::Gt, &value!(5), &xs));
        assert!(!comparison::compare(Relation::Gt, &value!(9), &xs));
        assert!(!comparison::compare(Relation::Gt, &value!(0), &value!([])));
    }

    #[test]
    fn test_exists_size_mod() {
        assert!(comparison::exists(true, &value!(0)));
        assert!(comparison::exists(true, &value!(false)));
        assert!(!comparison::exists(true, &Value::Null));
        assert!(comparison::exists(false, &Value::Undefined));

        assert!(comparison::size(2, &value!([1, 2])));
        assert!(comparison::size(3, &value!("héé")));
        assert!(!comparison::size(0, &Value::Undefined));
        assert!(!comparison::size(1, &value!(1)));

        assert!(comparison::modulo(3.0, 1.0, &value!(7)));
        assert!(!comparison::modulo(3.0, 1.0, &value!(6)));
        assert!(comparison::modulo(3.0, 1.0, &value!([6, 4])));
        assert!(!comparison::modulo(3.0, 1.0, &value!("7")));
    }

    #[test]
    fn test_membership() {
        let set = vec![value!(1), value!("a"), Value::Regex(Pattern::new("^z", "").unwrap())];
        assert!(membership::any_of(&set, &value!(1)));
        assert!(membership::any_of(&set, &value!("zebra")));
        assert!(membership::any_of(&set, &value!([5, "a"])));
        assert!(!membership::any_of(&set, &value!("b")));
        assert!(!membership::any_of(&set, &value!([])));
        assert!(membership::none_of(&set, &value!(2)));
        assert!(!membership::none_of(&set, &value!([2, 1])));
    }

    #[test]
    fn test_in_matches_whole_sequence_member() {
        let set = vec![value!([1, 2])];
        assert!(membership::any_of(&set, &value!([1, 2])));
    }

    #[test]
    fn test_all() {
        let set = vec![value!("a"), value!("b")];
        assert!(membership::all_of(&set, &value!(["b", "c", "a"])));
        assert!(!membership::all_of(&set, &value!(["a"])));
        assert!(membership::all_of(&[value!("a")], &value!("a")));
        assert!(!membership::all_of(&set, &Value::Undefined));
        assert!(membership::all_of(&[], &value!([1])));
    }

    #[test]
    fn test_inspection() {
        let p = Pattern::new("\\d+", "").unwrap();
        assert!(inspection::regex(&p, &value!("a1")));
        assert!(inspection::regex(&p, &value!(["x", "42"])));
        assert!(!inspection::regex(&p, &value!(42)));

        let pred = Predicate::new(|v| v.get("a").is_some());
        assert!(inspection::predicate(&pred, &value!({"a": 1})));

        assert!(inspection::type_of(ValueType::String, &value!("s")));
        assert!(inspection::type_of(ValueType::Date, &Value::date_from_millis(1).unwrap()));
        assert!(!inspection::type_of(ValueType::Object, &Value::Null));
    }
}
