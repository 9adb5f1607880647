//! Typed configuration for Tabula services.
//!
//! - TOML and JSON configuration files
//! - `PREFIX__SECTION__KEY` environment overrides
//! - Strict parsing (unknown fields are rejected)
//! - Layered loading (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! base_path = "/api/v1"
//! request_timeout_ms = 30000
//!
//! [api]
//! default_locale = "ru"
//! refresh_method = "tokens/postRefresh"
//! expose_throwables = false
//! limit_max = 30
//!
//! [telemetry]
//! service_name = "books"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [auth]
//! access_token_ttl_secs = 3600
//! refresh_token_ttl_secs = 2592000
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `TABULA__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `TABULA__API__EXPOSE_THROWABLES=true`
//! - `TABULA__TELEMETRY__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/tabula-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TabulaConfig, TabulaConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ApiConfig, AuthConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig,
    TelemetryConfigSection,
};
