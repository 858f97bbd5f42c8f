//! Error types for rootformula

use thiserror::Error;

/// rootformula error type
#[derive(Error, Debug)]
pub enum Error {
    /// Expression parsing/compilation error (tokenizer, parser or bytecode)
    #[error("Expression error: {0}")]
    Expression(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
