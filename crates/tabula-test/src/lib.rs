//! # Tabula Test
//!
//! Test utilities for Tabula APIs. Requests run through the real
//! [`Dispatcher`](tabula_server::Dispatcher) in-process: routing,
//! authentication, input validation and output serialization all apply, but
//! no socket is bound.
//!
//! ## Example
//!
//! ```ignore
//! use tabula_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_book() {
//!     let client = TestClient::new(dispatcher).with_token(token);
//!
//!     client
//!         .post("books")
//!         .json(&json!({"title": "Dune", "author": "Herbert", "isbn": "9780441013593"}))
//!         .send()
//!         .await
//!         .assert_ok()
//!         .assert_json_field("result.title", &json!("Dune"));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tabula-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestRequest};
pub use error::TestError;
pub use response::TestResponse;
