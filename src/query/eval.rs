use crate::value::Value;

use super::path::Segment;
use super::QueryResult;

/// Pending work: continue at `segments[pos]` from `value`.
struct Frame<'a> {
    pos: usize,
    value: &'a Value,
    /// Set once an enclosing projection or filter produced this branch.
    fanned: bool,
}

/// Walk `segments` from `root`.
///
/// Without a projection or filter the result is a single value or
/// `NotFound`. Once a fan-out fires, every branch contributes exactly one
/// terminal value in document order; a branch that dead-ends contributes
/// `Null` so `items.#.missing` stays as long as `items`.
pub fn evaluate(segments: &[Segment], root: &Value) -> QueryResult {
    let mut stack = vec![Frame {
        pos: 0,
        value: root,
        fanned: false,
    }];
    let mut out = Vec::new();
    let mut fired = false;

    while let Some(frame) = stack.pop() {
        let Some(segment) = segments.get(frame.pos) else {
            out.push(frame.value.clone());
            continue;
        };
        let next = frame.pos + 1;

        let step = match segment {
            Segment::Key(name) => step_key(frame.value, name),
            Segment::Index(i) => step_index(frame.value, *i),
            Segment::Project => {
                if let Value::Array(items) = frame.value {
                    fired = true;
                    // Reverse push so elements pop in document order
                    stack.extend(items.iter().rev().map(|value| Frame {
                        pos: next,
                        value,
                        fanned: true,
                    }));
                    continue;
                }
                None
            }
            Segment::Filter(pred) => {
                if let Value::Array(items) = frame.value {
                    fired = true;
                    stack.extend(items.iter().rev().filter(|v| pred.matches(v)).map(|value| {
                        Frame {
                            pos: next,
                            value,
                            fanned: true,
                        }
                    }));
                    continue;
                }
                None
            }
        };

        match step {
            Some(value) => stack.push(Frame {
                pos: next,
                value,
                fanned: frame.fanned,
            }),
            None if frame.fanned => out.push(Value::Null),
            None => {}
        }
    }

    if fired {
        QueryResult::Sequence(out)
    } else {
        match out.pop() {
            Some(v) => QueryResult::Value(v),
            None => QueryResult::NotFound,
        }
    }
}

/// Member access. Arrays accept a non-negative integer name as an index.
pub fn step_key<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(items) => array_index(name).and_then(|i| items.get(i)),
        _ => None,
    }
}

/// A dotted name read as an array index. Only plain ASCII digits qualify, so
/// `+1` or `-1` stay ordinary names.
pub fn array_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Bracket index; negative values count from the end.
pub fn step_index(value: &Value, index: i64) -> Option<&Value> {
    match value {
        Value::Array(items) => resolve_index(items.len(), index).map(|i| &items[i]),
        _ => None,
    }
}

/// Map a possibly negative index onto `0..len`.
pub fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index
    };
    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::path::Path;
    use serde_json::json;

    fn eval(doc: serde_json::Value, path: &str) -> QueryResult {
        let root = Value::from(doc);
        evaluate(&Path::parse(path).unwrap().segments, &root)
    }

    fn one(j: serde_json::Value) -> QueryResult {
        QueryResult::Value(Value::from(j))
    }

    fn many(j: serde_json::Value) -> QueryResult {
        match Value::from(j) {
            Value::Array(items) => QueryResult::Sequence(items.to_vec()),
            other => panic!("expected array fixture, got {other}"),
        }
    }

    fn catalog() -> serde_json::Value {
        json!({
            "items": [
                {"name": "Laptop", "price": 999.99, "inStock": true, "tags": ["electronics", "computers"]},
                {"name": "Mouse", "price": 29.99, "inStock": true, "tags": ["electronics", "accessories"]},
                {"name": "Keyboard", "price": 79.99, "inStock": false, "tags": []},
                {"name": "Monitor", "price": 349.99, "inStock": true}
            ]
        })
    }

    #[test]
    fn eval_simple_key() {
        assert_eq!(eval(json!({"name": "hello"}), "name"), one(json!("hello")));
    }

    #[test]
    fn eval_nested() {
        assert_eq!(eval(json!({"a": {"b": {"c": 42}}}), "a.b.c"), one(json!(42)));
    }

    #[test]
    fn eval_dot_index_and_bracket_index() {
        assert_eq!(eval(catalog(), "items.0.name"), one(json!("Laptop")));
        assert_eq!(eval(catalog(), "items[2].price"), one(json!(79.99)));
        assert_eq!(eval(catalog(), "items[-1].name"), one(json!("Monitor")));
    }

    #[test]
    fn numeric_key_on_object() {
        assert_eq!(eval(json!({"0": "zero"}), "0"), one(json!("zero")));
    }

    #[test]
    fn eval_missing_is_not_found() {
        assert_eq!(eval(json!({"a": 1}), "missing"), QueryResult::NotFound);
        assert_eq!(eval(json!({"a": 1}), "a.b"), QueryResult::NotFound);
        assert_eq!(eval(json!({"a": [1, 2]}), "a.5"), QueryResult::NotFound);
        assert_eq!(eval(json!({"a": [1, 2]}), "a[-3]"), QueryResult::NotFound);
        assert_eq!(eval(json!({"a": [1, 2]}), "a.-1"), QueryResult::NotFound);
    }

    #[test]
    fn explicit_null_is_found() {
        assert_eq!(eval(json!({"a": null}), "a"), one(json!(null)));
    }

    #[test]
    fn eval_projection() {
        assert_eq!(
            eval(catalog(), "items.#.name"),
            many(json!(["Laptop", "Mouse", "Keyboard", "Monitor"]))
        );
    }

    #[test]
    fn projection_records_null_for_missing() {
        assert_eq!(
            eval(catalog(), "items.#.tags.0"),
            many(json!(["electronics", "electronics", null, null]))
        );
        assert_eq!(eval(catalog(), "items.#.nope"), many(json!([null, null, null, null])));
    }

    #[test]
    fn trailing_projection_yields_elements() {
        assert_eq!(eval(json!({"a": [1, 2]}), "a.#"), many(json!([1, 2])));
        assert_eq!(eval(json!({"a": []}), "a.#.x"), many(json!([])));
    }

    #[test]
    fn projection_on_non_array_is_not_found() {
        assert_eq!(eval(json!({"a": {"b": 1}}), "a.#.b"), QueryResult::NotFound);
        assert_eq!(eval(json!({}), "a.#.b"), QueryResult::NotFound);
    }

    #[test]
    fn nested_projection_flattens_in_order() {
        let doc = json!({"g": [{"m": [{"n": 1}, {"n": 2}]}, {"m": [{"n": 3}]}, {"m": 5}]});
        assert_eq!(eval(doc, "g.#.m.#.n"), many(json!([1, 2, 3, null])));
    }

    #[test]
    fn eval_filter() {
        assert_eq!(
            eval(catalog(), "items[?(@.price>100)].name"),
            many(json!(["Laptop", "Monitor"]))
        );
        assert_eq!(
            eval(catalog(), "items[?(@.inStock==false)].name"),
            many(json!(["Keyboard"]))
        );
        assert_eq!(eval(catalog(), "items[?(@.price>5000)].name"), many(json!([])));
    }

    #[test]
    fn filter_then_projection() {
        assert_eq!(
            eval(catalog(), "items[?(@.name=~\"^M\")].tags.#"),
            many(json!(["electronics", "accessories", null]))
        );
    }

    #[test]
    fn filter_over_scalars() {
        assert_eq!(eval(json!({"n": [1, 5, 3, 9]}), "n[?(@>=5)]"), many(json!([5, 9])));
    }

    #[test]
    fn root_array_bracket() {
        assert_eq!(eval(json!([10, 20, 30]), "[1]"), one(json!(20)));
        assert_eq!(eval(json!([{"a": 1}, {"a": 2}]), "#.a"), many(json!([1, 2])));
    }

    #[test]
    fn array_index_accepts_digits_only() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("+1"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index(""), None);
        assert_eq!(eval(json!({"a": ["x", "y"]}), "a.+1"), QueryResult::NotFound);
    }

    #[test]
    fn resolve_negative_index() {
        assert_eq!(resolve_index(3, -1), Some(2));
        assert_eq!(resolve_index(3, -3), Some(0));
        assert_eq!(resolve_index(3, -4), None);
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }
}
