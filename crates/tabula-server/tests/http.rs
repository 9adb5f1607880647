//! End-to-end tests over a real TCP socket.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tabula_contract::prelude::*;
use tabula_contract::MethodRegistry;
use tabula_server::{Dispatcher, Envelope, Server, ShutdownSignal};
use tokio::net::{TcpListener, TcpStream};

struct Sum;

#[async_trait]
impl ImmutableMethod for Sum {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("math/postSum")
            .parameter("a", ParameterDeclaration::integer(Requirement::Required(3001)))
            .parameter("b", ParameterDeclaration::integer(Requirement::Required(3002)))
            .result(FieldDeclaration::integer(false))
            .build()
    }

    async fn handle(&self, input: &TypedInput) -> MethodResult {
        Ok(Some((input.require_int("a") + input.require_int("b")).into()))
    }
}

struct Started {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: tokio::task::JoinHandle<tabula_server::ServerResult<()>>,
}

async fn start(max_body_bytes: usize) -> Started {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::builder(Dispatcher::new(MethodRegistry::new().with_immutable(Sum)))
        .max_body_bytes(max_body_bytes)
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(server.serve(listener, shutdown.recv()));
    Started {
        addr,
        shutdown,
        handle,
    }
}

async fn send(addr: SocketAddr, request: Request<Full<Bytes>>) -> (StatusCode, http::HeaderMap, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(connection);
    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost")
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[tokio::test]
async fn test_json_body_round_trip() {
    let server = start(1024).await;
    let (status, headers, body) = send(
        server.addr,
        request(Method::POST, "/api/v1/math/sum", r#"{"a": 2, "b": "40"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    assert!(headers.contains_key("x-request-id"));

    let envelope: Envelope = serde_json::from_slice(&body).unwrap();
    assert!(envelope.ok);
    assert_eq!(envelope.result, json!(42));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_query_string_input() {
    let server = start(1024).await;
    let (status, _, body) = send(
        server.addr,
        request(Method::POST, "/api/v1/math/sum?a=1&b=2", r#"{"a": 100}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let envelope: Envelope = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope.result, json!(3));
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_contract_errors_are_bad_request() {
    let server = start(1024).await;
    let (status, _, body) = send(
        server.addr,
        request(Method::POST, "/api/v1/math/sum", r#"{"a": "x"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Envelope = serde_json::from_slice(&body).unwrap();
    assert!(!envelope.ok);
    assert_eq!(envelope.error_codes(), vec![3002, 3001, 3025]);
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_outside_base_path_is_not_found() {
    let server = start(1024).await;
    let (status, _, body) = send(server.addr, request(Method::GET, "/health", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["path"], json!("/health"));
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_preflight() {
    let server = start(1024).await;
    let (status, headers, body) =
        send(server.addr, request(Method::OPTIONS, "/api/v1/math/sum", "")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(body.is_empty());
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_body_limit() {
    let server = start(16).await;
    let (status, _, _) = send(
        server.addr,
        request(Method::POST, "/api/v1/math/sum", r#"{"a": 1, "b": 2, "padding": "xxxxxxxx"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = start(1024).await;
    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
