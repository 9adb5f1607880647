//! Error types for catalog building and rendering.

use thiserror::Error;

/// Errors that can occur while building or rendering a catalog.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the catalog to JSON.
    #[error("Failed to serialize catalog: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A registered method name cannot be split into a namespace path.
    #[error("Invalid method name '{name}': {reason}")]
    InvalidMethodName {
        /// The offending method name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// Two distinct models were registered under one name.
    #[error("Model name '{name}' is declared twice with different fields")]
    ConflictingModel {
        /// The shared model name.
        name: String,
    },
}

impl DocsError {
    /// Creates an [`DocsError::InvalidMethodName`].
    #[must_use]
    pub fn invalid_method_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMethodName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for catalog operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let err: DocsError = serde_json::from_str::<String>("invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::SerializationError(_)));
        assert!(err.to_string().contains("serialize"));
    }

    #[test]
    fn test_invalid_method_name_error() {
        let err = DocsError::invalid_method_name("books//get", "empty segment");
        assert!(err.to_string().contains("books//get"));
        assert!(err.to_string().contains("empty segment"));
    }

    #[test]
    fn test_conflicting_model_error() {
        let err = DocsError::ConflictingModel {
            name: "Book".to_string(),
        };
        assert!(err.to_string().contains("Book"));
    }
}
