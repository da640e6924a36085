//! Query and modify JSON documents with a compact path language.
//!
//! ```
//! use nqjson::{parser, query};
//!
//! let doc = parser::parse(r#"{"items": [{"price": 2}, {"price": 3}]}"#).unwrap();
//! let total = query::query(&doc, "items.#.price|@sum").unwrap();
//! assert_eq!(total.into_value().unwrap().to_string(), "5");
//! ```

pub mod bridge;
pub mod error;
pub mod output;
pub mod parser;
pub mod query;
pub mod stream;
pub mod value;

pub use error::NqError;
pub use query::QueryResult;
pub use value::Value;
