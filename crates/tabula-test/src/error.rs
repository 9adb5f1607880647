//! Test error types.

use thiserror::Error;

/// Errors that can occur while building or reading a test exchange.
#[derive(Debug, Error)]
pub enum TestError {
    /// A header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Query parameters could not be encoded.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Response body is not valid UTF-8.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
