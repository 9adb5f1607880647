//! Combined telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Returns the service name used in logs.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.logging.service_name
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    logging: Option<LogConfig>,
    metrics: Option<MetricsConfig>,
}

impl TelemetryConfigBuilder {
    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Sets the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.metrics = Some(config);
        self
    }

    /// Enables the metrics listener on `addr`.
    #[must_use]
    pub fn metrics_addr(mut self, addr: impl Into<String>) -> Self {
        let config = self.metrics.take().unwrap_or_default();
        self.metrics = Some(MetricsConfig {
            enabled: true,
            addr: addr.into(),
            ..config
        });
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let mut logging = self.logging.unwrap_or_default();
        if let Some(name) = self.service_name {
            logging.service_name = name;
        }
        TelemetryConfig {
            logging,
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = TelemetryConfig::builder().build();
        assert_eq!(config, TelemetryConfig::default());
        assert_eq!(config.service_name(), "tabula");
    }

    #[test]
    fn test_builder_overrides() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig::development())
            .service_name("books")
            .metrics_addr("127.0.0.1:9191")
            .build();

        assert_eq!(config.service_name(), "books");
        assert!(!config.logging.json_format);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr, "127.0.0.1:9191");
    }
}
