pub mod json;

pub use json::stream_ndjson;
