//! Configuration sections.

use serde::{Deserialize, Serialize};
use tabula_telemetry::{LogConfig, MetricsConfig as TelemetryMetrics, TelemetryConfig};

/// HTTP front settings.
///
/// # Example
///
/// ```
/// use tabula_config::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.base_path, "/api/v1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g. "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Path prefix under which methods are routed.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Body collection and handler timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            base_path: default_base_path(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_path() -> String {
    "/api/v1".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Contract layer behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Locale used when neither the session nor `Accept-Language` decide.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Method that accepts expired access credentials.
    #[serde(default = "default_refresh_method")]
    pub refresh_method: String,

    /// Emit `service_info.throwables` in responses.
    #[serde(default)]
    pub expose_throwables: bool,

    /// Default page size ceiling for selections.
    #[serde(default = "default_limit_max")]
    pub limit_max: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            refresh_method: default_refresh_method(),
            expose_throwables: false,
            limit_max: default_limit_max(),
        }
    }
}

fn default_locale() -> String {
    "ru".to_string()
}

fn default_refresh_method() -> String {
    "tokens/postRefresh".to_string()
}

fn default_limit_max() -> u32 {
    30
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus listener.
    #[serde(default)]
    pub enabled: bool,

    /// Listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,

    /// Histogram bucket boundaries for request duration.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_histogram_buckets() -> Vec<f64> {
    TelemetryMetrics::default().duration_buckets
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    #[default]
    Json,
    /// Human-readable pretty format.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name for logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TelemetryConfigSection {
    /// Converts the section into the telemetry crate's runtime config.
    #[must_use]
    pub fn to_telemetry(&self) -> TelemetryConfig {
        let preset = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        let logging = LogConfig {
            enabled: self.logging.enabled,
            file_line_info: self.logging.include_location,
            ..preset
        }
        .with_level(self.logging.level.clone());

        TelemetryConfig::builder()
            .service_name(self.service_name.clone())
            .logging(logging)
            .metrics(TelemetryMetrics {
                enabled: self.metrics.enabled,
                addr: self.metrics.addr.clone(),
                duration_buckets: self.metrics.histogram_buckets.clone(),
            })
            .build()
    }
}

fn default_service_name() -> String {
    "tabula".to_string()
}

/// Token lifetimes for the session collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: default_access_ttl(),
            refresh_token_ttl_secs: default_refresh_ttl(),
        }
    }
}

fn default_access_ttl() -> u64 {
    60 * 60
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_true() -> bool {
    true
}
