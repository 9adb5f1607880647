//! The root [`TabulaConfig`] type and its builder.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tabula_core::Locale;

use crate::{ApiConfig, AuthConfig, ConfigError, LogFormat, ServerConfig, TelemetryConfigSection};

/// Complete service configuration.
///
/// # Example
///
/// ```
/// use tabula_config::TabulaConfig;
///
/// let config = TabulaConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TabulaConfig {
    /// HTTP front.
    #[serde(default)]
    pub server: ServerConfig,

    /// Contract layer.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,

    /// Token lifetimes.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl TabulaConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TabulaConfigBuilder {
        TabulaConfigBuilder::default()
    }

    /// Checks every value that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if !is_valid_base_path(&self.server.base_path) {
            return Err(ConfigError::invalid(
                "server.base_path",
                format!(
                    "must start with '/', must not end with '/' and must not contain empty segments: {}",
                    self.server.base_path
                ),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout_ms",
                "must be positive",
            ));
        }

        if Locale::from_code(&self.api.default_locale).is_none() {
            return Err(ConfigError::invalid(
                "api.default_locale",
                format!("unsupported locale: {}", self.api.default_locale),
            ));
        }

        if self.api.refresh_method.trim().is_empty() {
            return Err(ConfigError::invalid(
                "api.refresh_method",
                "must not be empty",
            ));
        }

        if self.api.limit_max == 0 {
            return Err(ConfigError::invalid("api.limit_max", "must be positive"));
        }

        if self.auth.access_token_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "auth.access_token_ttl_secs",
                "must be positive",
            ));
        }

        if self.auth.refresh_token_ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "auth.refresh_token_ttl_secs",
                "must be positive",
            ));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Pretty debug logs and exposed throwables.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.api.expose_throwables = true;
        config
    }

    /// JSON info logs, metrics on, throwables hidden.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config.api.expose_throwables = false;
        config
    }

    /// The configured default locale, falling back to [`Locale::default`]
    /// for values that did not pass [`Self::validate`].
    #[must_use]
    pub fn default_locale(&self) -> Locale {
        Locale::from_code(&self.api.default_locale).unwrap_or_default()
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

fn is_valid_base_path(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    path.strip_prefix('/')
        .is_some_and(|rest| !rest.is_empty() && rest.split('/').all(|s| !s.is_empty()))
}

/// Builder for [`TabulaConfig`].
#[derive(Debug, Default)]
pub struct TabulaConfigBuilder {
    server: Option<ServerConfig>,
    api: Option<ApiConfig>,
    telemetry: Option<TelemetryConfigSection>,
    auth: Option<AuthConfig>,
}

impl TabulaConfigBuilder {
    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the API section.
    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the auth section.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> TabulaConfig {
        TabulaConfig {
            server: self.server.unwrap_or_default(),
            api: self.api.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
            auth: self.auth.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<TabulaConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
