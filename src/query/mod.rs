pub mod eval;
pub mod filter;
pub mod lexer;
pub mod modifiers;
pub mod multipath;
pub mod mutate;
pub mod path;

use tracing::debug;

use crate::error::NqError;
use crate::value::Value;

use self::multipath::MultiPath;
use self::path::Path;

/// Outcome of a read query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The path addresses nothing. Distinct from a stored `null`.
    NotFound,
    /// A single value, from a path without projections or filters, or from an
    /// aggregating modifier.
    Value(Value),
    /// Fan-out output, a sequence-producing modifier, or a multipath.
    Sequence(Vec<Value>),
}

impl QueryResult {
    pub fn exists(&self) -> bool {
        !matches!(self, QueryResult::NotFound)
    }

    /// Collapse to a plain value; sequences become arrays.
    pub fn into_value(self) -> Option<Value> {
        match self {
            QueryResult::NotFound => None,
            QueryResult::Value(v) => Some(v),
            QueryResult::Sequence(items) => Some(Value::array(items)),
        }
    }
}

/// Evaluate a query string (possibly a comma-separated multipath) against a
/// document.
pub fn query(root: &Value, query_str: &str) -> Result<QueryResult, NqError> {
    debug!(query = query_str, "evaluating query");
    let multipath = MultiPath::parse(query_str)?;
    multipath.evaluate(root)
}

/// Return a new document with `value` stored at `path_str`.
pub fn set(root: &Value, path_str: &str, value: Value) -> Result<Value, NqError> {
    debug!(path = path_str, "set");
    let path = single_path(path_str)?;
    mutate::set(root, &path, value)
}

/// Return a new document with the member or element at `path_str` removed.
pub fn delete(root: &Value, path_str: &str) -> Result<Value, NqError> {
    debug!(path = path_str, "delete");
    let path = single_path(path_str)?;
    mutate::delete(root, &path)
}

fn single_path(path_str: &str) -> Result<Path, NqError> {
    let mut multipath = MultiPath::parse(path_str)?;
    if multipath.paths.len() != 1 {
        return Err(NqError::TypeMismatch(format!(
            "cannot modify {} paths at once: {path_str}",
            multipath.paths.len()
        )));
    }
    Ok(multipath.paths.remove(0))
}
