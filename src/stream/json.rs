use tracing::trace;

use crate::error::NqError;
use crate::parser;
use crate::query::multipath::MultiPath;
use crate::query::QueryResult;

/// Stream newline-delimited JSON (NDJSON/JSON Lines), evaluating the query
/// against each non-empty line. The callback gets the 1-based line number
/// and that line's result.
pub fn stream_ndjson<F>(input: &str, query_str: &str, mut on_result: F) -> Result<(), NqError>
where
    F: FnMut(usize, QueryResult) -> Result<(), NqError>,
{
    // Parse once, evaluate per record
    let query = MultiPath::parse(query_str)?;

    for (idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = parser::parse(line).map_err(|e| match e {
            NqError::InvalidDocument(msg) => {
                NqError::InvalidDocument(format!("line {}: {msg}", idx + 1))
            }
            other => other,
        })?;
        let result = query.evaluate(&value)?;
        trace!(line = idx + 1, exists = result.exists(), "ndjson record");
        on_result(idx + 1, result)?;
    }

    Ok(())
}
