use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::error::NqError;
use crate::value::Value;

use super::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Sum,
    Avg,
    Min,
    Max,
    Sort,
    Reverse,
    First,
    Last,
    Distinct,
    Flatten,
    Count,
}

impl Modifier {
    /// Parse one pipeline stage. The `@` sigil is optional.
    pub fn parse(input: &str, pos: usize) -> Result<Self, NqError> {
        let name = input.strip_prefix('@').unwrap_or(input);
        match name {
            "sum" => Ok(Modifier::Sum),
            "avg" => Ok(Modifier::Avg),
            "min" => Ok(Modifier::Min),
            "max" => Ok(Modifier::Max),
            "sort" => Ok(Modifier::Sort),
            "reverse" => Ok(Modifier::Reverse),
            "first" => Ok(Modifier::First),
            "last" => Ok(Modifier::Last),
            "distinct" => Ok(Modifier::Distinct),
            "flatten" => Ok(Modifier::Flatten),
            "count" => Ok(Modifier::Count),
            "" => Err(NqError::syntax(pos, "empty modifier")),
            other => Err(NqError::syntax(pos, format!("unknown modifier: {other}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::Sum => "sum",
            Modifier::Avg => "avg",
            Modifier::Min => "min",
            Modifier::Max => "max",
            Modifier::Sort => "sort",
            Modifier::Reverse => "reverse",
            Modifier::First => "first",
            Modifier::Last => "last",
            Modifier::Distinct => "distinct",
            Modifier::Flatten => "flatten",
            Modifier::Count => "count",
        }
    }
}

/// Output of one stage: either a single value or a sequence.
enum Stage {
    One(Value),
    Many(Vec<Value>),
}

impl Stage {
    /// Promote to a sequence: arrays contribute their elements, anything else
    /// becomes a one-element sequence.
    fn into_items(self) -> Vec<Value> {
        match self {
            Stage::Many(items) => items,
            Stage::One(Value::Array(items)) => Arc::unwrap_or_clone(items),
            Stage::One(v) => vec![v],
        }
    }
}

/// Run `modifiers` left to right over an evaluator result.
pub fn apply(modifiers: &[Modifier], input: QueryResult) -> Result<QueryResult, NqError> {
    if modifiers.is_empty() {
        return Ok(input);
    }

    let mut stage = match input {
        QueryResult::NotFound => return Ok(QueryResult::NotFound),
        QueryResult::Value(v) => Stage::One(v),
        QueryResult::Sequence(items) => Stage::Many(items),
    };

    for m in modifiers {
        let items = stage.into_items();
        trace!(modifier = m.name(), len = items.len(), "applying modifier");
        stage = apply_one(*m, items)?;
    }

    Ok(match stage {
        Stage::One(v) => QueryResult::Value(v),
        Stage::Many(items) => QueryResult::Sequence(items),
    })
}

fn apply_one(modifier: Modifier, mut items: Vec<Value>) -> Result<Stage, NqError> {
    let stage = match modifier {
        Modifier::Sum => Stage::One(Value::Number(numbers(&items).sum())),
        Modifier::Avg => {
            let (total, count) = numbers(&items).fold((0.0, 0usize), |(t, c), n| (t + n, c + 1));
            let avg = if count == 0 { 0.0 } else { total / count as f64 };
            Stage::One(Value::Number(avg))
        }
        Modifier::Min => Stage::One(extreme(&items, Ordering::Less)),
        Modifier::Max => Stage::One(extreme(&items, Ordering::Greater)),
        Modifier::Sort => {
            sort_values(&mut items)?;
            Stage::Many(items)
        }
        Modifier::Reverse => {
            items.reverse();
            Stage::Many(items)
        }
        Modifier::First => Stage::One(items.into_iter().next().unwrap_or_default()),
        Modifier::Last => Stage::One(items.pop().unwrap_or_default()),
        Modifier::Distinct => Stage::Many(distinct(items)),
        Modifier::Flatten => {
            let mut flat = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(inner) => flat.extend(inner.iter().cloned()),
                    other => flat.push(other),
                }
            }
            Stage::Many(flat)
        }
        Modifier::Count => Stage::One(Value::Number(items.len() as f64)),
    };
    Ok(stage)
}

/// Hashable identity of a scalar. Numbers compare by value, so `-0.0` and
/// `0.0` share a key.
#[derive(PartialEq, Eq, Hash)]
enum ScalarKey<'a> {
    Null,
    Bool(bool),
    Number(u64),
    String(&'a str),
}

fn scalar_key(value: &Value) -> Option<ScalarKey<'_>> {
    match value {
        Value::Null => Some(ScalarKey::Null),
        Value::Bool(b) => Some(ScalarKey::Bool(*b)),
        Value::Number(n) if *n == 0.0 => Some(ScalarKey::Number(0)),
        Value::Number(n) => Some(ScalarKey::Number(n.to_bits())),
        Value::String(s) => Some(ScalarKey::String(s)),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// First occurrence of each value. Scalars are hashed; containers fall back
/// to deep equality against the containers already kept.
fn distinct(items: Vec<Value>) -> Vec<Value> {
    let keep: Vec<bool> = {
        let mut scalars = HashSet::new();
        let mut containers: Vec<&Value> = Vec::new();
        items
            .iter()
            .map(|item| match scalar_key(item) {
                Some(key) => scalars.insert(key),
                None if containers.contains(&item) => false,
                None => {
                    containers.push(item);
                    true
                }
            })
            .collect()
    };
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

/// Numeric elements only; everything else is skipped.
fn numbers(items: &[Value]) -> impl Iterator<Item = f64> + '_ {
    items.iter().filter_map(Value::as_f64)
}

fn extreme(items: &[Value], want: Ordering) -> Value {
    numbers(items)
        .reduce(|best, n| if n.total_cmp(&best) == want { n } else { best })
        .map(Value::Number)
        .unwrap_or_default()
}

fn sort_values(items: &mut [Value]) -> Result<(), NqError> {
    if items.iter().all(|v| matches!(v, Value::Number(_))) {
        items.sort_by(|a, b| match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
            _ => Ordering::Equal,
        });
        Ok(())
    } else if items.iter().all(|v| matches!(v, Value::String(_))) {
        items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        Ok(())
    } else {
        let kinds: Vec<&str> = items.iter().map(Value::type_name).collect();
        Err(NqError::TypeMismatch(format!(
            "sort requires all numbers or all strings, found [{}]",
            kinds.join(", ")
        )))
    }
}
