//! Text-in, text-out operations for hosting layers.
//!
//! Documents and values cross this boundary as JSON text. Nothing here
//! returns an error: failures are folded into the response so a host can
//! serialize whatever comes back.

use serde::Serialize;

use crate::error::NqError;
use crate::parser;
use crate::query::{self, QueryResult};
use crate::value::Value;

/// Result of `get`. `value` and `type` are present only when the path
/// resolved; `error` only when the document or path could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetResponse {
    pub exists: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GetResponse {
    fn found(value: Value) -> Self {
        GetResponse {
            exists: true,
            kind: Some(value.type_name()),
            value: Some(value),
            error: None,
        }
    }

    fn missing() -> Self {
        GetResponse {
            exists: false,
            kind: None,
            value: None,
            error: None,
        }
    }

    fn failed(err: &NqError) -> Self {
        GetResponse {
            error: Some(err.to_string()),
            ..GetResponse::missing()
        }
    }
}

impl From<QueryResult> for GetResponse {
    fn from(result: QueryResult) -> Self {
        match result.into_value() {
            Some(value) => GetResponse::found(value),
            None => GetResponse::missing(),
        }
    }
}

/// Result of `set` and `delete`: `{"json": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MutationResponse {
    Ok { json: String },
    Err { error: String },
}

impl MutationResponse {
    fn from_result(result: Result<Value, NqError>) -> Self {
        match result.and_then(|doc| {
            serde_json::to_string(&doc).map_err(|e| NqError::InvalidDocument(e.to_string()))
        }) {
            Ok(json) => MutationResponse::Ok { json },
            Err(e) => MutationResponse::Err {
                error: e.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, MutationResponse::Ok { .. })
    }
}

/// Evaluate `path` against the JSON text `document`.
pub fn get(document: &str, path: &str) -> GetResponse {
    match parser::parse(document).and_then(|root| query::query(&root, path)) {
        Ok(result) => GetResponse::from(result),
        Err(e) => GetResponse::failed(&e),
    }
}

/// Store the JSON text `value` at `path` and return the new document text.
pub fn set(document: &str, path: &str, value: &str) -> MutationResponse {
    MutationResponse::from_result(parser::parse(document).and_then(|root| {
        let value = parser::parse_value(value)?;
        query::set(&root, path, value)
    }))
}

/// Remove whatever `path` addresses and return the new document text.
pub fn delete(document: &str, path: &str) -> MutationResponse {
    MutationResponse::from_result(
        parser::parse(document).and_then(|root| query::delete(&root, path)),
    )
}
