//! Hosting errors.

use thiserror::Error;

/// Errors raised while binding or serving the HTTP front.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be parsed or bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// I/O error while accepting connections.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Creates a [`ServerError::Bind`] error.
    #[must_use]
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind(message.into())
    }
}

/// Result type for hosting operations.
pub type ServerResult<T> = Result<T, ServerError>;
