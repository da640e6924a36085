//! Set and Delete.
//!
//! Both take the old root by reference and return a new one. The new root is a
//! cheap clone whose spine is copied on write by `Arc::make_mut`; any subtree
//! off the mutated path stays shared with the old root.

use std::sync::Arc;

use crate::error::NqError;
use crate::value::{Map, Value};

use super::eval::{array_index, resolve_index, step_index, step_key};
use super::path::{Path, Segment};

/// Store `value` at `path`, creating missing objects and arrays on the way.
pub fn set(root: &Value, path: &Path, value: Value) -> Result<Value, NqError> {
    check_writable(path)?;

    let mut new_root = root.clone();
    let mut slot = &mut new_root;
    for segment in &path.segments {
        slot = match segment {
            Segment::Key(name) => key_slot(slot, name)?,
            Segment::Index(i) => index_slot(slot, *i)?,
            Segment::Project | Segment::Filter(_) => return Err(fanout_error(path)),
        };
    }
    *slot = value;
    Ok(new_root)
}

/// Remove the member or element at `path`. Removing something that is not
/// there returns the document unchanged.
pub fn delete(root: &Value, path: &Path) -> Result<Value, NqError> {
    check_writable(path)?;

    let Some((last, parents)) = path.segments.split_last() else {
        return Ok(root.clone());
    };
    if !exists(root, &path.segments) {
        return Ok(root.clone());
    }

    let mut new_root = root.clone();
    let mut node = &mut new_root;
    for segment in parents {
        node = match existing_child(node, segment) {
            Some(child) => child,
            None => return Ok(root.clone()),
        };
    }

    match (node, last) {
        (Value::Object(map), Segment::Key(name)) => {
            Arc::make_mut(map).shift_remove(name);
        }
        (Value::Array(items), Segment::Key(name)) => {
            if let Some(i) = array_index(name) {
                Arc::make_mut(items).remove(i);
            }
        }
        (Value::Array(items), Segment::Index(i)) => {
            if let Some(i) = resolve_index(items.len(), *i) {
                Arc::make_mut(items).remove(i);
            }
        }
        _ => {}
    }
    Ok(new_root)
}

fn check_writable(path: &Path) -> Result<(), NqError> {
    if path.has_fanout() {
        return Err(fanout_error(path));
    }
    if !path.modifiers.is_empty() {
        return Err(NqError::TypeMismatch(format!(
            "cannot modify through a modifier pipeline: {path}"
        )));
    }
    Ok(())
}

fn fanout_error(path: &Path) -> NqError {
    NqError::TypeMismatch(format!(
        "cannot modify through a projection or filter: {path}"
    ))
}

fn exists(root: &Value, segments: &[Segment]) -> bool {
    let mut current = root;
    for segment in segments {
        let next = match segment {
            Segment::Key(name) => step_key(current, name),
            Segment::Index(i) => step_index(current, *i),
            Segment::Project | Segment::Filter(_) => None,
        };
        match next {
            Some(v) => current = v,
            None => return false,
        }
    }
    true
}

/// Mutable counterpart of `step_key`/`step_index` for a path known to exist.
fn existing_child<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), Segment::Key(name)) => Arc::make_mut(map).get_mut(name),
        (Value::Array(items), Segment::Key(name)) => {
            let i = array_index(name)?;
            Arc::make_mut(items).get_mut(i)
        }
        (Value::Array(items), Segment::Index(i)) => {
            let i = resolve_index(items.len(), *i)?;
            Arc::make_mut(items).get_mut(i)
        }
        _ => None,
    }
}

/// Slot for member `name`. A null slot becomes an empty object first.
fn key_slot<'a>(slot: &'a mut Value, name: &str) -> Result<&'a mut Value, NqError> {
    if slot.is_null() {
        *slot = Value::object(Map::new());
    }
    match slot {
        Value::Object(map) => Ok(Arc::make_mut(map)
            .entry(name.to_string())
            .or_insert(Value::Null)),
        Value::Array(items) => {
            let items = Arc::make_mut(items);
            if name == "-1" {
                return Ok(append(items));
            }
            let len = items.len();
            match array_index(name) {
                Some(i) if i < len => Ok(&mut items[i]),
                Some(i) => Err(out_of_bounds(i as i64, len)),
                None => Err(NqError::TypeMismatch(format!(
                    "cannot set key {name:?} on an array"
                ))),
            }
        }
        other => Err(NqError::TypeMismatch(format!(
            "cannot set key {name:?} on a {}",
            other.type_name()
        ))),
    }
}

/// Slot for bracket index `index`. A null slot becomes an empty array first;
/// `-1` appends.
fn index_slot(slot: &mut Value, index: i64) -> Result<&mut Value, NqError> {
    if slot.is_null() {
        *slot = Value::array(Vec::new());
    }
    match slot {
        Value::Array(items) => {
            let items = Arc::make_mut(items);
            if index == -1 {
                return Ok(append(items));
            }
            let len = items.len();
            match resolve_index(len, index) {
                Some(i) => Ok(&mut items[i]),
                None => Err(out_of_bounds(index, len)),
            }
        }
        other => Err(NqError::TypeMismatch(format!(
            "cannot set index [{index}] on a {}",
            other.type_name()
        ))),
    }
}

fn append(items: &mut Vec<Value>) -> &mut Value {
    items.push(Value::Null);
    let last = items.len() - 1;
    &mut items[last]
}

fn out_of_bounds(index: i64, len: usize) -> NqError {
    NqError::TypeMismatch(format!(
        "index {index} out of bounds for array of length {len} (use -1 to append)"
    ))
}
