//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to parse the metrics listener address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl TelemetryError {
    /// Creates a [`TelemetryError::LoggingInit`] error.
    #[must_use]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::LoggingInit(message.into())
    }

    /// Creates a [`TelemetryError::MetricsInit`] error.
    #[must_use]
    pub fn metrics(message: impl Into<String>) -> Self {
        Self::MetricsInit(message.into())
    }
}
