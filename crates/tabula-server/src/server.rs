//! The HTTP front.
//!
//! Accepts HTTP/1.1 connections with hyper and hands every request under the
//! base path to the [`Dispatcher`]. Everything else gets a plain JSON 404.
//!
//! # Example
//!
//! ```no_run
//! use tabula_contract::MethodRegistry;
//! use tabula_server::{Dispatcher, Server};
//!
//! # async fn run() -> tabula_server::ServerResult<()> {
//! let server = Server::builder(Dispatcher::new(MethodRegistry::new()))
//!     .http_addr("127.0.0.1:8080")
//!     .build();
//! server.run().await
//! # }
//! ```

use crate::dispatcher::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::request::{ApiRequest, ApiResponse};
use crate::routing::strip_base_path;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// HTTP response type produced by the front.
pub type HttpResponse = Response<Full<Bytes>>;

/// Methods advertised to preflight requests.
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Headers advertised to preflight requests.
const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept-Language";

/// Hosting settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Address to bind.
    pub http_addr: String,
    /// Upper bound for reading the body and for running the method.
    pub request_timeout: Duration,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// How long to wait for open connections after shutdown is triggered.
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    settings: ServerSettings,
}

impl Server {
    /// Creates a server with default settings.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            settings: ServerSettings::default(),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(dispatcher: Dispatcher) -> ServerBuilder {
        ServerBuilder {
            dispatcher,
            settings: ServerSettings::default(),
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(crate::shutdown::wait_for_os_signal())
            .await
    }

    /// Binds the configured address and serves until `shutdown` completes.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> ServerResult<()> {
        let addr: SocketAddr = self.settings.http_addr.parse().map_err(|e| {
            ServerError::bind(format!("invalid address '{}': {e}", self.settings.http_addr))
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(format!("failed to bind {addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` completes, then
    /// waits up to the shutdown timeout for open connections to finish.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send,
    ) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            base_path = %self.dispatcher.config().base_path,
            methods = self.dispatcher.registry().len(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();
        let signal = ShutdownSignal::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let signal = signal.clone();
                        tokio::spawn(async move {
                            if let Err(err) = server.handle_connection(stream, signal).await {
                                tracing::debug!(remote = %remote, error = %err, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        signal.trigger();
        let timeout = server.settings.shutdown_timeout;
        if tokio::time::timeout(timeout, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);
        tokio::select! {
            result = connection.as_mut() => return result,
            () = shutdown.recv() => connection.as_mut().graceful_shutdown(),
        }
        connection.await
    }

    async fn handle_request(&self, request: Request<Incoming>) -> HttpResponse {
        let (parts, body) = request.into_parts();

        if parts.method == Method::OPTIONS {
            return preflight();
        }
        if strip_base_path(&self.dispatcher.config().base_path, parts.uri.path()).is_none() {
            return not_found(parts.uri.path());
        }

        let collected = tokio::time::timeout(
            self.settings.request_timeout,
            Limited::new(body, self.settings.max_body_bytes).collect(),
        )
        .await;
        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(err)) if err.downcast_ref::<LengthLimitError>().is_some() => {
                return error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "request body is too large",
                );
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "failed to read request body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "failed to read request body",
                );
            }
            Err(_) => {
                return error_response(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "request body collection timed out",
                );
            }
        };

        let api_request = ApiRequest::from_uri(parts.method, &parts.uri)
            .with_headers(parts.headers)
            .with_body(body);
        match tokio::time::timeout(
            self.settings.request_timeout,
            self.dispatcher.dispatch(api_request),
        )
        .await
        {
            Ok(response) => into_http(response),
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "method execution timed out");
                error_response(
                    StatusCode::GATEWAY_TIMEOUT,
                    "METHOD_TIMEOUT",
                    "method execution timed out",
                )
            }
        }
    }
}

/// Converts a dispatcher response into a hyper response.
#[must_use]
pub fn into_http(response: ApiResponse) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    let mut http = Response::new(Full::new(body));
    *http.status_mut() = status;
    *http.headers_mut() = headers;
    http
}

fn preflight() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

fn not_found(path: &str) -> HttpResponse {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found", "path": path }),
    )
}

fn error_response(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    json_response(
        status,
        &serde_json::json!({ "error": { "code": code, "message": message } }),
    )
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Builder for [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    dispatcher: Dispatcher,
    settings: ServerSettings,
}

impl ServerBuilder {
    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.settings.http_addr = addr.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub const fn max_body_bytes(mut self, max: usize) -> Self {
        self.settings.max_body_bytes = max;
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.settings.shutdown_timeout = timeout;
        self
    }

    /// Replaces all settings.
    #[must_use]
    pub fn settings(mut self, settings: ServerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            dispatcher: Arc::new(self.dispatcher),
            settings: self.settings,
        }
    }
}
