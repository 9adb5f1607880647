//! # Tabula Server
//!
//! Runs declared methods behind HTTP.
//!
//! - [`routing`] rewrites `VERB /base/segments[/id]` into a method name
//! - [`Dispatcher`] authenticates, validates input, invokes the method and
//!   builds the [`Envelope`]
//! - [`Serializer`] checks method output against its declaration
//! - [`Server`] is the hyper front with graceful shutdown
//!
//! The dispatcher is transport-independent: tests and in-process clients call
//! [`Dispatcher::dispatch`] with an [`ApiRequest`] directly.

#![doc(html_root_url = "https://docs.rs/tabula-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod envelope;
mod error;
mod request;
mod resolver;
pub mod routing;
mod serializer;
mod server;
pub mod shutdown;

pub use dispatcher::{
    response_headers, Dispatcher, DispatcherConfig, DEFAULT_BASE_PATH, DEFAULT_REFRESH_METHOD,
    REQUEST_ID_HEADER,
};
pub use envelope::{Envelope, ServiceInfo, Throwable};
pub use error::{ServerError, ServerResult};
pub use request::{ApiRequest, ApiResponse};
pub use resolver::{ResolvedCredential, SessionResolver};
pub use serializer::{Serializer, PASSTHROUGH_PREFIX};
pub use server::{into_http, HttpResponse, Server, ServerBuilder, ServerSettings};
pub use shutdown::ShutdownSignal;
