//! Error types for the stream consumer

use thiserror::Error;

/// Client-side error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No byte arrived within the first-byte deadline")]
    FirstByteTimeout,

    #[error("Stream transport error: {0}")]
    StreamTransport(String),

    #[error("Server error frame: {0}")]
    ErrorFrame(String),

    #[error("Fallback request error: {0}")]
    Fallback(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Network-class failures are the only ones eligible for the
    /// fallback path's single automatic retry.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::FirstByteTimeout | Self::StreamTransport(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
