// Demonstration of query compilation and filtering
//
// Run with: cargo run --example sift_demo

use jsonsift::{compile, register_operator, sift, sift_by, OperatorOptions, Selector, Value};
use serde_json::json;

fn main() {
    println!("=== jsonsift Demo ===\n");

    demo_filtering();
    demo_operators();
    demo_dates();
    demo_selectors();
    demo_custom_operator();
    demo_ordering();
}

fn people() -> Vec<Value> {
    vec![
        json!({"name": "craig", "age": 90001, "tags": ["admin", "ops"], "address": {"city": "minneapolis"}}).into(),
        json!({"name": "tim", "age": 33, "tags": ["ops"], "address": {"city": "st. paul"}}).into(),
        json!({"name": "liz", "age": 27, "tags": []}).into(),
    ]
}

fn show(title: &str, query: serde_json::Value, items: &[Value]) {
    let q: Value = query.into();
    match sift(&q, items) {
        Ok(found) => {
            let names: Vec<String> = found
                .iter()
                .map(|p| p.get("name").map(|n| n.to_string()).unwrap_or_else(|| p.to_string()))
                .collect();
            println!("  {:<28} {} => [{}]", title, q, names.join(", "));
        }
        Err(e) => println!("  {:<28} {} => error: {}", title, q, e),
    }
}

fn demo_filtering() {
    println!("--- Filtering ---");
    let items = people();
    show("age below 100", json!({"age": {"$lt": 100}}), &items);
    show("tag present", json!({"tags": "ops"}), &items);
    show("nested field", json!({"address.city": "st. paul"}), &items);
    show("missing field", json!({"address": {"$exists": false}}), &items);
    println!();
}

fn demo_operators() {
    println!("--- Operators ---");
    let items = people();
    show("$in", json!({"name": {"$in": ["tim", "liz"]}}), &items);
    show("$all", json!({"tags": {"$all": ["ops", "admin"]}}), &items);
    show("$size", json!({"tags": {"$size": 0}}), &items);
    show("$regex", json!({"name": {"$regex": "^c"}}), &items);
    show("$or", json!({"$or": [{"age": 27}, {"name": "craig"}]}), &items);
    show("$not", json!({"age": {"$not": {"$gt": 30}}}), &items);
    show("unknown operator", json!({"$near": 1}), &items);
    println!();
}

fn demo_dates() {
    println!("--- Dates ---");
    let events: Vec<Value> = (0..4)
        .filter_map(|day| Value::date_from_millis(day * 86_400_000))
        .map(|at| Value::singleton("at", at))
        .collect();
    let cutoff = Value::date_from_millis(2 * 86_400_000).unwrap_or(Value::Null);
    let q = Value::singleton("at", Value::singleton("$gte", cutoff));
    match sift(&q, &events) {
        Ok(found) => println!("  events on or after day 2: {}", found.len()),
        Err(e) => println!("  error: {}", e),
    }
    println!();
}

fn demo_selectors() {
    println!("--- Selectors ---");
    let items = people();
    if let Ok(selector) = Selector::path("address.city") {
        let q: Value = json!({"$regex": "^min"}).into();
        if let Ok(found) = sift_by(&q, &items, selector) {
            println!("  city starts with 'min': {}", found.len());
        }
    }
    println!();
}

fn demo_custom_operator() {
    println!("--- Custom operator ---");
    register_operator(
        "between",
        |operand, candidate, _| {
            let bounds = operand.as_value().and_then(Value::as_array);
            match (bounds, candidate.as_f64()) {
                (Some(b), Some(n)) if b.len() == 2 => {
                    b[0].as_f64().is_some_and(|lo| n >= lo) && b[1].as_f64().is_some_and(|hi| n <= hi)
                }
                _ => false,
            }
        },
        OperatorOptions::default(),
    );
    show("$between", json!({"age": {"$between": [20, 30]}}), &people());
    println!();
}

fn demo_ordering() {
    println!("--- Evaluation order ---");
    let q: Value = json!({"$or": [{"a": 1}, {"b": 2}], "tags": {"$in": ["x", "y"]}, "name": "tim"}).into();
    if let Ok(statement) = compile(&q) {
        for expr in statement.expressions() {
            println!(
                "  {:<6} {:<8} cost {}",
                expr.operator_name(),
                expr.field().unwrap_or(""),
                expr.cost()
            );
        }
    }
}
