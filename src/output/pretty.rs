use crate::error::NqError;
use crate::value::Value;

use super::color;

/// Format a Value as JSON text.
pub fn format_value(value: &Value, compact: bool, raw: bool) -> Result<String, NqError> {
    format_value_colored(value, compact, raw, false)
}

/// Like `format_value`, with ANSI colors when `colorize` is set. Compact
/// output is never colored.
pub fn format_value_colored(
    value: &Value,
    compact: bool,
    raw: bool,
    colorize: bool,
) -> Result<String, NqError> {
    // Raw mode: if the value is a string, output it without quotes
    if raw {
        if let Value::String(s) = value {
            return Ok(s.to_string());
        }
    }

    if colorize && !compact {
        return Ok(color::colorize_json(value));
    }

    let result = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    result.map_err(|e| NqError::InvalidDocument(e.to_string()))
}
