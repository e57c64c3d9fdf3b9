//! Error types for bookfeed.
//!
//! Per-attempt fetch and parse failures are recorded as values on
//! [`FetchAttempt`](crate::route::FetchAttempt) and never surface here.
//! Only setup and request-level failures use this type.

use thiserror::Error;

/// Common error type for bookfeed.
#[derive(Error, Debug)]
pub enum BookfeedError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for request or config input.
    #[error("validation error: {0}")]
    Validation(String),

    /// HTTP client error (client construction, not individual fetches).
    #[error("HTTP client error: {0}")]
    Http(String),

    /// A request-level failure that escaped the per-attempt handling.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for BookfeedError {
    fn from(e: reqwest::Error) -> Self {
        BookfeedError::Http(e.to_string())
    }
}

impl From<tokio::task::JoinError> for BookfeedError {
    fn from(e: tokio::task::JoinError) -> Self {
        BookfeedError::Internal(format!("feed task failed: {e}"))
    }
}

/// Result type alias for bookfeed operations.
pub type Result<T> = std::result::Result<T, BookfeedError>;
