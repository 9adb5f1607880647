//! # Tabula Docs
//!
//! Discovery for Tabula APIs.
//!
//! This crate provides:
//! - **Catalog**: a serializable snapshot of every registered method, the
//!   models they return and the error descriptions, built from a
//!   [`MethodRegistry`](tabula_contract::MethodRegistry)
//! - **Codegen support**: type mapping for JavaScript and Dart clients,
//!   resolved into a [`ClientManifest`] that templates render
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabula_docs::{Catalog, ClientManifest, JavaScript};
//! use tabula_core::{ErrorDescriptions, Locale};
//!
//! let catalog = Catalog::build(&registry, &descriptions, Locale::En)?;
//! std::fs::write("catalog.json", catalog.to_json_pretty()?)?;
//!
//! let manifest = ClientManifest::generate(&catalog, &JavaScript);
//! ```

#![doc(html_root_url = "https://docs.rs/tabula-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
mod codegen;
mod error;

pub use catalog::{
    method_error_codes, Catalog, ErrorEntry, HttpMethod, MethodEntry, ModelEntry, Namespace,
    ParameterEntry,
};
pub use codegen::{
    snake_to_camel, ClientArgument, ClientField, ClientManifest, ClientMethod, ClientModel, Dart,
    JavaScript, TargetLanguage,
};
pub use error::{DocsError, DocsResult};
