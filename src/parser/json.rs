use crate::error::NqError;
use crate::value::Value;

/// Parse document text. Empty or whitespace-only input is rejected.
pub fn parse(input: &str) -> Result<Value, NqError> {
    if input.trim().is_empty() {
        return Err(NqError::InvalidDocument("document is empty".into()));
    }
    serde_json::from_str(input).map_err(|e| NqError::InvalidDocument(e.to_string()))
}

/// Parse the JSON text of a value to store with Set.
pub fn parse_value(input: &str) -> Result<Value, NqError> {
    serde_json::from_str(input.trim())
        .map_err(|e| NqError::InvalidDocument(format!("value is not valid JSON: {e}")))
}
