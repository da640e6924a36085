pub mod color;
pub mod pretty;
