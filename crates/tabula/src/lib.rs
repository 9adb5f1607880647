//! # Tabula
//!
//! **Typed RPC contract layer**
//!
//! Every API method declares its parameters, result model and possible
//! errors up front. Tabula validates input against that declaration,
//! serializes results through model contracts and answers with a uniform
//! `{ok, result, errors}` envelope:
//!
//! - **Contracts**: parameters, models, enums and selection (sort and paging)
//! - **Dispatch**: routing `VERB /path` to a method name, sessions, locales
//! - **Server**: a hyper HTTP/1.1 front end with graceful shutdown
//! - **Discovery**: a catalog of every method for docs and client codegen
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabula::prelude::*;
//!
//! let registry = MethodRegistry::new().with_immutable(GetBooks::new(store));
//! let dispatcher = Dispatcher::new(registry);
//!
//! Server::builder(dispatcher)
//!     .http_addr("0.0.0.0:8080")
//!     .build()
//!     .run()
//!     .await?;
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → Route → Session → Locale → Access → Input → Method
//!                                                          ↓
//! Response ← Envelope ← Serializer ←──────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/tabula/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Error codes, phrases, sessions and locales
pub use tabula_core as core;

// Method and model declarations
pub use tabula_contract as contract;

// Dispatcher and HTTP server
pub use tabula_server as server;

// Layered configuration
pub use tabula_config as config;

// Logging and metrics
pub use tabula_telemetry as telemetry;

// Discovery catalog
pub use tabula_docs as docs;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use tabula::prelude::*;
/// ```
pub mod prelude {
    pub use tabula_contract::prelude::*;
    pub use tabula_contract::MethodRegistry;

    pub use tabula_core::{
        codes, Actor, ApiError, ApiResult, ErrorCode, ErrorDescriptions, Failure, Locale, Phrase,
        Session,
    };

    pub use tabula_server::{
        Dispatcher, DispatcherConfig, ResolvedCredential, Server, SessionResolver,
    };

    pub use tabula_config::{ConfigLoader, TabulaConfig};

    pub use tabula_docs::Catalog;
}
