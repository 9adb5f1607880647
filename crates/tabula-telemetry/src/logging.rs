//! Structured logging for Tabula services.
//!
//! Output is either JSON (one object per event, for log shippers) or the
//! pretty multi-line format for local development. The filter accepts the
//! usual `EnvFilter` directives, so `info,tabula_server=debug` works.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabula_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(method = "getBooks", "dispatching");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default service name attached to log output.
pub const DEFAULT_SERVICE_NAME: &str = "tabula";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "tabula_server=debug").
    pub level: String,

    /// Whether to output JSON.
    pub json_format: bool,

    /// Whether to log span open/close events.
    pub span_events: bool,

    /// Whether to include file and line.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include the event target.
    pub include_target: bool,

    /// Service name, emitted once at startup.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output at debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

/// Installs the global subscriber.
///
/// Disabled configs are a no-op. Installing twice fails with
/// [`TelemetryError::LoggingInit`].
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::logging(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::logging(e.to_string()))?;
    }

    tracing::info!(
        service.name = %config.service_name,
        "Logging initialized"
    );

    Ok(())
}

/// Parses a filter directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::logging(format!("Invalid log level: {e}")))
}

/// Standard log field names.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// Resolved API method name.
    pub const METHOD: &str = "method";

    /// HTTP verb.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request path.
    pub const HTTP_PATH: &str = "http.path";

    /// HTTP status code.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// Contract error code.
    pub const ERROR_CODE: &str = "error_code";

    /// Offending input field.
    pub const INPUT_FIELD: &str = "input_field";

    /// Error message.
    pub const ERROR: &str = "error";

    /// Session or user identifier.
    pub const ACTOR: &str = "actor";

    /// Request locale.
    pub const LOCALE: &str = "locale";

    /// Service name.
    pub const SERVICE_NAME: &str = "service.name";
}

/// Logs a request start event.
#[macro_export]
macro_rules! log_request_start {
    ($request_id:expr, $http_method:expr, $path:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            http.method = %$http_method,
            http.path = %$path,
            "Request started"
        );
    };
}

/// Logs a request completion event.
#[macro_export]
macro_rules! log_request_complete {
    ($request_id:expr, $method:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            request_id = %$request_id,
            method = %$method,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "Request completed"
        );
    };
}

/// Logs a failure that is not a contract error.
#[macro_export]
macro_rules! log_request_error {
    ($request_id:expr, $method:expr, $error:expr) => {
        tracing::error!(
            request_id = %$request_id,
            method = %$method,
            error = %$error,
            "Request failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        assert_eq!(LogConfig::default(), LogConfig::production());
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert!(config.json_format);
        assert!(!config.span_events);
        assert_eq!(config.level, "info");
        assert_eq!(config.service_name, "tabula");
    }

    #[test]
    fn test_builders() {
        let config = LogConfig::production()
            .with_level("warn,tabula_server=debug")
            .with_service_name("books");
        assert_eq!(config.level, "warn,tabula_server=debug");
        assert_eq!(config.service_name, "books");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("tabula_server=debug,warn").is_ok());
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_macros_expand() {
        let request_id = "0191e3a4-0000-7000-8000-000000000000";
        crate::log_request_start!(request_id, "GET", "/api/v1/books");
        crate::log_request_complete!(request_id, "getBooks", 200u16, 1.5f64);
        crate::log_request_error!(request_id, "getBooks", "boom");
    }
}
