//! In-process test client.

use crate::error::TestError;
use crate::response::TestResponse;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use tabula_contract::MethodRegistry;
use tabula_server::{ApiRequest, Dispatcher};

/// A test client that runs requests through a [`Dispatcher`] without
/// binding a socket.
///
/// Paths without a leading `/` are taken relative to the dispatcher's base
/// path, so `client.get("books")` reaches `GET /api/v1/books` by default.
///
/// # Example
///
/// ```
/// use tabula_contract::MethodRegistry;
/// use tabula_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::from_registry(MethodRegistry::new());
/// let response = client.get("books").send().await;
/// response.assert_error_codes(&[1002]);
/// # });
/// ```
#[must_use]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client over `dispatcher`.
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self {
            dispatcher: dispatcher.into(),
            default_headers: Vec::new(),
        }
    }

    /// Creates a client over a default dispatcher for `registry`.
    pub fn from_registry(registry: MethodRegistry) -> Self {
        Self::new(Dispatcher::new(registry))
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sends `token` as the bearer credential with every request.
    pub fn with_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_default_header(header::AUTHORIZATION.as_str(), value)
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Creates a GET request builder.
    pub fn get(&self, path: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::GET, path)
    }

    /// Creates a POST request builder.
    pub fn post(&self, path: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, path: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::PUT, path)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, path: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::DELETE, path)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> TestRequest<'_> {
        let path = path.as_ref();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!(
                "{}/{path}",
                self.dispatcher.config().base_path.trim_end_matches('/')
            )
        };
        let mut request = TestRequest {
            client: self,
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: Bytes::new(),
            error: None,
        };
        for (name, value) in &self.default_headers {
            request = request.header(name, value);
        }
        request
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
pub struct TestRequest<'a> {
    client: &'a TestClient,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest<'_> {
    /// Sets a header, replacing an earlier value of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers
            .push((name.to_string(), value.as_ref().to_string()));
        self
    }

    /// Sets the bearer credential.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header(header::AUTHORIZATION.as_str(), value)
    }

    /// Sets the `Accept-Language` header.
    pub fn accept_language(self, language: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT_LANGUAGE.as_str(), language)
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the request body as JSON and the matching content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.error = Some(TestError::Json(e)),
        }
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Builds the request the dispatcher will see.
    pub fn build(self) -> Result<ApiRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let mut request = ApiRequest::new(self.method, self.path)
            .with_headers(headers)
            .with_body(self.body);
        if !self.query.is_empty() {
            let query = serde_urlencoded::to_string(&self.query)
                .map_err(|e| TestError::InvalidQuery(e.to_string()))?;
            request = request.with_query(query);
        }
        Ok(request)
    }

    /// Dispatches the request and returns the response, or the error that
    /// prevented building it.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let dispatcher = Arc::clone(&self.client.dispatcher);
        let request = self.build()?;
        Ok(dispatcher.dispatch(request).await.into())
    }

    /// Dispatches the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        self.try_send()
            .await
            .unwrap_or_else(|e| panic!("test request could not be built: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tabula_contract::prelude::*;

    struct Echo;

    #[async_trait]
    impl ImmutableMethod for Echo {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getEcho")
                .parameter("text", ParameterDeclaration::string(Requirement::Required(3002)))
                .result(FieldDeclaration::string(false))
                .build()
        }

        async fn handle(&self, input: &TypedInput) -> MethodResult {
            Ok(Some(input.require_string("text").into()))
        }
    }

    fn client() -> TestClient {
        TestClient::from_registry(MethodRegistry::new().with_immutable(Echo))
    }

    #[tokio::test]
    async fn test_query_input() {
        let response = client().get("echo").query("text", "hello").send().await;
        response.assert_ok().assert_result(&json!("hello"));
        assert!(response.request_id().is_some());
    }

    #[tokio::test]
    async fn test_json_input() {
        client()
            .get("echo")
            .json(&json!({"text": "  padded "}))
            .send()
            .await
            .assert_ok()
            .assert_result(&json!("padded"));
    }

    #[tokio::test]
    async fn test_absolute_path() {
        client()
            .get("/api/v1/echo")
            .query("text", "x")
            .send()
            .await
            .assert_ok();
    }

    #[tokio::test]
    async fn test_contract_error() {
        client()
            .get("echo")
            .send()
            .await
            .assert_status(http::StatusCode::BAD_REQUEST)
            .assert_error_codes(&[3002]);
    }

    #[tokio::test]
    async fn test_invalid_header_is_reported() {
        let result = client().get("echo").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_build_applies_default_headers() {
        let client = client()
            .with_token("secret")
            .with_default_header("Accept-Language", "en");
        let request = client
            .post("books")
            .accept_language("kk")
            .query("a", 1)
            .query("b", "two words")
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/api/v1/books");
        assert_eq!(request.query(), Some("a=1&b=two+words"));
        assert_eq!(request.bearer_token(), Some("secret"));
        assert_eq!(request.accept_language(), Some("kk"));
    }
}
