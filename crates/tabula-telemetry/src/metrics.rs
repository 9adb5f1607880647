//! Prometheus metrics for the dispatcher.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `tabula_requests_total` | Counter | `method`, `ok` |
//! | `tabula_request_duration_seconds` | Histogram | `method` |
//! | `tabula_contract_errors_total` | Counter | `code` |
//! | `tabula_contract_violations_total` | Counter | - |
//!
//! The recording functions go through the `metrics` facade, so they are
//! free no-ops until [`init_metrics`] installs a recorder.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tabula_core::ErrorCode;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "tabula_requests_total";
/// Request latency histogram name.
pub const REQUEST_DURATION: &str = "tabula_request_duration_seconds";
/// Contract error counter name.
pub const CONTRACT_ERRORS_TOTAL: &str = "tabula_contract_errors_total";
/// Contract violation counter name.
pub const CONTRACT_VIOLATIONS_TOTAL: &str = "tabula_contract_violations_total";

/// Label value used when the method could not be resolved.
pub const UNKNOWN_METHOD: &str = "unknown";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether a Prometheus listener is installed.
    pub enabled: bool,

    /// Listener address (e.g. "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder with an HTTP listener.
///
/// Must be called from within a tokio runtime. Disabled configs are a no-op.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::metrics(e.to_string()))?
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::metrics(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    tracing::info!(%addr, "Prometheus metrics listener installed");
    Ok(())
}

/// Renders metrics in Prometheus text format, if a recorder is installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of API method calls");
    describe_histogram!(REQUEST_DURATION, "API method call duration in seconds");
    describe_counter!(
        CONTRACT_ERRORS_TOTAL,
        "Contract errors returned to callers, by code"
    );
    describe_counter!(
        CONTRACT_VIOLATIONS_TOTAL,
        "Responses degraded to an internal error"
    );
}

/// Records a finished call.
pub fn record_request(method: &str, ok: bool, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "ok" => ok.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "method" => method.to_string()).record(duration.as_secs_f64());
}

/// Records one contract error reported in `errors[]`.
pub fn record_contract_error(code: ErrorCode) {
    counter!(CONTRACT_ERRORS_TOTAL, "code" => code.to_string()).increment(1);
}

/// Records a response degraded by a violation or unexpected failure.
pub fn record_contract_violation() {
    counter!(CONTRACT_VIOLATIONS_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not an address".to_string(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_request("getBooks", true, Duration::from_millis(3));
        record_request(UNKNOWN_METHOD, false, Duration::from_millis(1));
        record_contract_error(2005);
        record_contract_violation();
    }
}
