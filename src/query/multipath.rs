use crate::error::NqError;
use crate::value::Value;

use super::lexer::split_top_level;
use super::path::Path;
use super::{eval, modifiers, QueryResult};

/// Comma-separated subpaths evaluated independently against one document.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPath {
    pub paths: Vec<Path>,
}

impl MultiPath {
    pub fn parse(input: &str) -> Result<Self, NqError> {
        if input.is_empty() {
            return Err(NqError::syntax(0, "empty path"));
        }
        let paths = split_top_level(input, ',', 0)?
            .into_iter()
            .map(|piece| {
                if piece.text.is_empty() {
                    Err(NqError::syntax(piece.offset, "empty subpath"))
                } else {
                    Path::parse_at(&piece.text, piece.offset)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MultiPath { paths })
    }

    /// A single subpath returns its own result. Several subpaths yield one
    /// element per subpath, in order, with not-found subpaths as `null`;
    /// sequences are nested, not flattened.
    pub fn evaluate(&self, root: &Value) -> Result<QueryResult, NqError> {
        if let [only] = self.paths.as_slice() {
            return evaluate_path(only, root);
        }
        let mut combined = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            combined.push(evaluate_path(path, root)?.into_value().unwrap_or_default());
        }
        Ok(QueryResult::Sequence(combined))
    }
}

/// Navigate one subpath and run its modifier pipeline.
pub fn evaluate_path(path: &Path, root: &Value) -> Result<QueryResult, NqError> {
    let result = eval::evaluate(&path.segments, root);
    modifiers::apply(&path.modifiers, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(doc: serde_json::Value, q: &str) -> QueryResult {
        MultiPath::parse(q).unwrap().evaluate(&Value::from(doc)).unwrap()
    }

    fn user() -> serde_json::Value {
        json!({"user": {"name": "John Doe", "email": "john@example.com", "id": 123}, "scores": [1, 2, 3]})
    }

    #[test]
    fn parse_splits_subpaths() {
        let mp = MultiPath::parse("user.name,user.email,user.role").unwrap();
        assert_eq!(mp.paths.len(), 3);
    }

    #[test]
    fn single_path_is_unwrapped() {
        assert_eq!(run(user(), "user.name"), QueryResult::Value(Value::from("John Doe")));
        assert_eq!(run(user(), "user.nope"), QueryResult::NotFound);
    }

    #[test]
    fn combines_in_order() {
        assert_eq!(
            run(user(), "user.name,user.email").into_value(),
            Some(Value::from(json!(["John Doe", "john@example.com"])))
        );
    }

    #[test]
    fn nested_sequences_are_not_flattened() {
        assert_eq!(
            run(user(), "user.id,scores").into_value(),
            Some(Value::from(json!([123, [1, 2, 3]])))
        );
    }

    #[test]
    fn missing_subpath_becomes_null() {
        assert_eq!(
            run(user(), "user.name,user.nope").into_value(),
            Some(Value::from(json!(["John Doe", null])))
        );
    }

    #[test]
    fn each_subpath_owns_its_modifiers() {
        assert_eq!(
            run(user(), "scores|@sum,scores|@max,scores|@reverse").into_value(),
            Some(Value::from(json!([6, 3, [3, 2, 1]])))
        );
    }

    #[test]
    fn empty_subpath_errors() {
        for q in ["", "a,,b", ",a", "a,"] {
            assert!(MultiPath::parse(q).is_err(), "{q:?} should fail");
        }
        match MultiPath::parse("a,,b").unwrap_err() {
            NqError::SyntaxError { position, .. } => assert_eq!(position, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn subpath_errors_report_absolute_offsets() {
        match MultiPath::parse("user.name,user..email").unwrap_err() {
            NqError::SyntaxError { position, .. } => assert_eq!(position, 15),
            other => panic!("unexpected {other:?}"),
        }
    }
}
