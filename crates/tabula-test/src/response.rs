//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tabula_core::ErrorCode;
use tabula_server::{ApiResponse, Envelope, REQUEST_ID_HEADER};

/// A dispatched response with helpers for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request id the dispatcher assigned.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header_str(REQUEST_ID_HEADER)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Deserializes the body as a response envelope.
    pub fn envelope(&self) -> Result<Envelope, TestError> {
        self.json()
    }

    /// Returns `true` when the envelope reports success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.envelope().is_ok_and(|e| e.ok)
    }

    /// The envelope `result`, or `Null` when the body is not an envelope.
    #[must_use]
    pub fn result(&self) -> Value {
        self.envelope().map(|e| e.result).unwrap_or(Value::Null)
    }

    /// The codes of the envelope `errors`, in order.
    #[must_use]
    pub fn error_codes(&self) -> Vec<ErrorCode> {
        self.envelope().map(|e| e.error_codes()).unwrap_or_default()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a 200 response whose envelope is `ok`.
    ///
    /// # Panics
    ///
    /// Panics on any other status or on a failed envelope.
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK);
        let envelope = self.require_envelope();
        assert!(
            envelope.ok,
            "Expected ok envelope, got errors {:?}",
            envelope.error_codes()
        );
        self
    }

    /// Asserts a failed envelope carrying exactly `expected` codes, in order.
    ///
    /// # Panics
    ///
    /// Panics if the envelope is ok or the codes differ.
    pub fn assert_error_codes(&self, expected: &[ErrorCode]) -> &Self {
        let envelope = self.require_envelope();
        assert!(!envelope.ok, "Expected failed envelope, got ok");
        assert_eq!(envelope.error_codes(), expected, "Error codes mismatch");
        self
    }

    /// Asserts a failed envelope whose codes include `code`.
    ///
    /// # Panics
    ///
    /// Panics if the envelope is ok or lacks the code.
    pub fn assert_error_code(&self, code: ErrorCode) -> &Self {
        let codes = self.require_envelope().error_codes();
        assert!(
            codes.contains(&code),
            "Expected error {code} in {codes:?}"
        );
        self
    }

    /// Asserts that the envelope `result` equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the result doesn't match.
    pub fn assert_result(&self, expected: &Value) -> &Self {
        let envelope = self.require_envelope();
        assert_eq!(&envelope.result, expected, "Result mismatch");
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{name}': expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// Paths are dot-separated; numeric segments index arrays, as in
    /// `result.books.0.title`.
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &Value) -> &Self {
        let path = path.as_ref();
        let json = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body should be valid JSON: {e}"));
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{path}' not found in: {json}"));
        assert_eq!(
            actual, expected,
            "JSON field '{path}': expected {expected}, got {actual}"
        );
        self
    }

    fn require_envelope(&self) -> Envelope {
        self.envelope().unwrap_or_else(|e| {
            panic!(
                "Body should be an envelope ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

impl From<ApiResponse> for TestResponse {
    fn from(response: ApiResponse) -> Self {
        let (status, headers, body) = response.into_parts();
        Self::new(status, headers, body)
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index),
            _ => current.get(segment),
        })
}
