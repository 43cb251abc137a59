//! Error types for the chat delivery server

use thiserror::Error;

/// Server-side error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config lookup error: {0}")]
    Config(String),

    #[error("Knowledge retrieval error: {0}")]
    Retrieval(String),

    #[error("Model invocation error: {0}")]
    Model(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
