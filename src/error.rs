use thiserror::Error;

#[derive(Error, Debug)]
pub enum NqError {
    #[error("syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NqError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        NqError::SyntaxError {
            position,
            message: message.into(),
        }
    }
}
