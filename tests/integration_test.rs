// Integration tests for Compiler + Evaluator
//
// These tests compile complete query documents and run them against data
// through the public API only.

use jsonsift::{
    compile, compile_with, register_operator, sift, sift_by, OperatorOptions, OperatorRegistry,
    QueryError, Selector, Sifter, Value,
};
use serde_json::json;

fn query(q: serde_json::Value) -> jsonsift::Statement {
    compile(&q.into()).unwrap()
}

fn data(d: serde_json::Value) -> Value {
    d.into()
}

#[test]
fn test_end_to_end_filter() {
    let items: Vec<Value> = vec![
        json!({"age": 30, "tags": ["vip"]}).into(),
        json!({"age": 17, "tags": ["vip"]}).into(),
        json!({"age": 40, "tags": ["new"]}).into(),
    ];
    let q: Value = json!({"age": {"$gte": 21}, "tags": {"$in": ["vip"]}}).into();

    let result = sift(&q, &items).unwrap();
    assert_eq!(result, vec![data(json!({"age": 30, "tags": ["vip"]}))]);
}

#[test]
fn test_equality_matches_normalized_values() {
    let cases = vec![
        (json!(1), json!(1), true),
        (json!(1), json!(2), false),
        (json!("a"), json!("a"), true),
        (json!("1"), json!(1), false),
        (json!(true), json!(true), true),
        (json!(null), json!(null), true),
        (json!(0), json!(false), false),
    ];
    for (v, d, expected) in cases {
        let stmt = query(json!({"f": v}));
        assert_eq!(stmt.test(&data(json!({"f": d}))), expected, "{} vs {}", v, d);
    }
}

#[test]
fn test_dates_in_queries_and_data() {
    let early = Value::date_from_millis(1_600_000_000_000).unwrap();
    let late = Value::date_from_millis(1_700_000_000_000).unwrap();

    let stmt = compile(&Value::singleton("at", Value::singleton("$lt", late.clone()))).unwrap();
    assert!(stmt.test(&Value::singleton("at", early.clone())));
    assert!(!stmt.test(&Value::singleton("at", late.clone())));

    let stmt = compile(&Value::singleton("at", early.clone())).unwrap();
    assert!(stmt.test(&Value::singleton("at", early)));
    assert!(!stmt.test(&Value::singleton("at", late)));
}

#[test]
fn test_logical_connectives() {
    let x = data(json!({"a": 1, "b": 2}));

    assert!(query(json!({"$and": [{"a": 1}, {"b": 2}]})).test(&x));
    assert!(!query(json!({"$and": [{"a": 1}, {"b": 1}]})).test(&x));
    assert!(query(json!({"$or": [{"a": 5}, {"b": 2}]})).test(&x));
    assert!(!query(json!({"$or": [{"a": 5}, {"b": 5}]})).test(&x));
    assert!(query(json!({"$nor": [{"a": 5}, {"b": 5}]})).test(&x));
    assert!(!query(json!({"$nor": [{"a": 1}, {"b": 5}]})).test(&x));

    assert!(query(json!({"$or": []})).test(&x));
    assert!(query(json!({"$and": []})).test(&x));
}

#[test]
fn test_not_is_negation() {
    let inner = json!({"a": {"$gt": 1}});
    let negated = query(json!({"$not": inner.clone()}));
    let plain = query(inner);

    for d in [json!({"a": 0}), json!({"a": 2}), json!({}), json!([{"a": 3}])] {
        let d = data(d);
        assert_eq!(negated.test(&d), !plain.test(&d));
    }
}

#[test]
fn test_dot_path_equivalence() {
    let dotted = query(json!({"a.b": 3}));
    let nested = query(json!({"a": {"b": 3}}));

    for d in [
        json!({"a": {"b": 3}}),
        json!({"a": {"b": 4}}),
        json!({"a": [{"b": 4}, {"b": 3}]}),
        json!({"a": 3}),
        json!({}),
    ] {
        let d = data(d);
        assert_eq!(dotted.test(&d), nested.test(&d), "{}", d);
    }
}

#[test]
fn test_existential_traversal() {
    let stmt = query(json!({"items.qty": {"$gt": 5}}));
    assert!(stmt.test(&data(json!({"items": [{"qty": 1}, {"qty": 9}]}))));
    assert!(!stmt.test(&data(json!({"items": [{"qty": 1}, {"qty": 5}]}))));
    assert!(!stmt.test(&data(json!({"items": []}))));
}

#[test]
fn test_exists_on_empty_object() {
    let empty = data(json!({}));
    assert!(!query(json!({"a": {"$exists": true}})).test(&empty));
    assert!(query(json!({"a": {"$exists": false}})).test(&empty));
    assert!(!query(json!({"a": {"$exists": true}})).test(&data(json!({"a": null}))));
    assert!(query(json!({"a": {"$exists": true}})).test(&data(json!({"a": 0}))));
}

#[test]
fn test_in_and_nin_are_complementary() {
    let set = json!([1, "two", [3]]);
    let in_q = query(json!({"$in": set.clone()}));
    let nin_q = query(json!({"$nin": set}));

    for d in [json!(1), json!("two"), json!(3), json!([3]), json!([9, 1]), json!(null), json!({})] {
        let d = data(d);
        assert_ne!(in_q.test(&d), nin_q.test(&d), "{}", d);
    }
}

#[test]
fn test_unknown_operator() {
    let err = compile(&data(json!({"$bogus": 1}))).unwrap_err();
    assert_eq!(err, QueryError::UnknownOperator("$bogus".to_string()));
}

#[test]
fn test_invalid_operands() {
    for q in [
        json!({"$where": "return true"}),
        json!({"$mod": [0, 1]}),
        json!({"$not": 5}),
        json!({"$and": {}}),
        json!({"$type": "float"}),
    ] {
        assert!(matches!(
            compile(&data(q)),
            Err(QueryError::InvalidOperand { .. })
        ));
    }
}

#[test]
fn test_size_mod_type_regex() {
    let doc = data(json!({"name": "Jack", "tags": ["a", "b"], "n": 7}));
    assert!(query(json!({"tags": {"$size": 2}})).test(&doc));
    assert!(query(json!({"name": {"$size": 4}})).test(&doc));
    assert!(query(json!({"n": {"$mod": [3, 1]}})).test(&doc));
    assert!(query(json!({"n": {"$type": "number"}})).test(&doc));
    assert!(!query(json!({"missing": {"$type": "number"}})).test(&doc));
    assert!(!query(json!({"name": {"$regex": "^ja", "$type": "string"}})).test(&doc));
    assert!(query(json!({"name": {"$regex": "(?i)^ja"}})).test(&doc));
    assert!(query(json!({"tags": {"$all": ["b", "a"]}})).test(&doc));
}

#[test]
fn test_where_predicate() {
    let q = Value::singleton(
        "$where",
        Value::predicate(|v| v.get("a").and_then(Value::as_f64) == v.get("b").and_then(Value::as_f64)),
    );
    let items = vec![data(json!({"a": 1, "b": 1})), data(json!({"a": 1, "b": 2}))];
    assert_eq!(sift(&q, &items).unwrap().len(), 1);
}

#[test]
fn test_selector_paths() {
    let items = vec![
        data(json!({"user": {"name": "ann"}})),
        data(json!({"user": {"name": "bob"}})),
    ];
    let out = sift_by(&data(json!("bob")), &items, Selector::path("user.name").unwrap()).unwrap();
    assert_eq!(out, vec![data(json!({"user": {"name": "bob"}}))]);

    assert!(matches!(
        Selector::path("user..name"),
        Err(QueryError::MalformedSelector(_))
    ));
}

#[test]
fn test_registered_operator_in_default_registry() {
    register_operator(
        "startsWith",
        |operand, candidate, _| match (operand.as_value().and_then(Value::as_str), candidate.as_str()) {
            (Some(prefix), Some(s)) => s.starts_with(prefix),
            _ => false,
        },
        OperatorOptions::default(),
    );

    let sifter = Sifter::new(&data(json!({"name": {"$startsWith": "jo"}}))).unwrap();
    assert!(sifter.test(&data(json!({"name": "john"}))));
    assert!(!sifter.test(&data(json!({"name": "mary"}))));
}

#[test]
fn test_reregistration_leaves_compiled_statements_alone() {
    let mut registry = OperatorRegistry::new();
    registry.register("flag", |_, _, _| true, OperatorOptions::default());
    let before = compile_with(&data(json!({"$flag": 1})), &registry).unwrap();

    registry.register("flag", |_, _, _| false, OperatorOptions::default());
    let after = compile_with(&data(json!({"$flag": 1})), &registry).unwrap();

    let x = data(json!(0));
    assert!(before.test(&x));
    assert!(!after.test(&x));
}

#[test]
fn test_statement_is_reusable() {
    let stmt = query(json!({"n": {"$gt": 2}}));
    let hits = (0..6)
        .map(|n| data(json!({"n": n})))
        .filter(|d| stmt.test(d))
        .count();
    assert_eq!(hits, 3);
}
