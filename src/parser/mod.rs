pub mod json;

pub use json::{parse, parse_value};
