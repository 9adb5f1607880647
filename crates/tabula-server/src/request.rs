//! Transport-independent request and response types.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use serde_json::{Map, Value};

/// A request as seen by the [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiRequest {
    /// Creates a request without query, headers or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Builds a request from a URI that may carry a query string.
    #[must_use]
    pub fn from_uri(method: Method, uri: &http::Uri) -> Self {
        let mut request = Self::new(method, uri.path());
        request.query = uri.query().map(str::to_string);
        request
    }

    /// Sets the raw query string (without `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP verb.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// The bearer credential from `Authorization`, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    /// The `Accept-Language` header value, if any.
    #[must_use]
    pub fn accept_language(&self) -> Option<&str> {
        self.headers
            .get(header::ACCEPT_LANGUAGE)?
            .to_str()
            .ok()
    }

    /// The raw method input.
    ///
    /// A non-empty query string wins. Otherwise the body is used when it is a
    /// JSON object. Anything else yields an empty object.
    #[must_use]
    pub fn input_data(&self) -> Map<String, Value> {
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            return query_to_json(query);
        }
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Decodes a query string into a JSON object of strings.
///
/// Repeated keys and keys ending in `[]` collect into arrays.
fn query_to_json(query: &str) -> Map<String, Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    let mut map = Map::new();
    for (key, value) in pairs {
        let (key, forced_array) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (key, false),
        };
        let value = Value::String(value);
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if forced_array => {
                map.insert(key, Value::Array(vec![value]));
            }
            None => {
                map.insert(key, value);
            }
        }
    }
    map
}

/// A finished response: status, headers and the serialized envelope.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    /// Assembles a response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Splits into parts.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_wins_over_body() {
        let request = ApiRequest::new(Method::GET, "/api/v1/books")
            .with_query("limit=5&query=rust")
            .with_body(r#"{"limit": 10}"#);
        let data = request.input_data();
        assert_eq!(data.get("limit"), Some(&json!("5")));
        assert_eq!(data.get("query"), Some(&json!("rust")));
    }

    #[test]
    fn test_empty_query_falls_back_to_body() {
        let request = ApiRequest::new(Method::POST, "/api/v1/books")
            .with_query("")
            .with_body(r#"{"title": "Dune", "year_published": 1965}"#);
        let data = request.input_data();
        assert_eq!(data.get("title"), Some(&json!("Dune")));
        assert_eq!(data.get("year_published"), Some(&json!(1965)));
    }

    #[test]
    fn test_non_object_body_is_empty() {
        let request = ApiRequest::new(Method::POST, "/x").with_body("[1, 2]");
        assert!(request.input_data().is_empty());
        let request = ApiRequest::new(Method::POST, "/x").with_body("not json");
        assert!(request.input_data().is_empty());
    }

    #[test]
    fn test_query_arrays() {
        let data = query_to_json("ids[]=1&ids[]=2&tag=a&tag=b&one[]=x&name=%D0%BA%D0%BD%D0%B8%D0%B3%D0%B0");
        assert_eq!(data.get("ids"), Some(&json!(["1", "2"])));
        assert_eq!(data.get("tag"), Some(&json!(["a", "b"])));
        assert_eq!(data.get("one"), Some(&json!(["x"])));
        assert_eq!(data.get("name"), Some(&json!("книга")));
    }

    #[test]
    fn test_bearer_token() {
        let request = ApiRequest::new(Method::GET, "/").with_header("authorization", "Bearer abc");
        assert_eq!(request.bearer_token(), Some("abc"));

        let request = ApiRequest::new(Method::GET, "/").with_header("authorization", "bearer  xyz ");
        assert_eq!(request.bearer_token(), Some("xyz"));

        let request = ApiRequest::new(Method::GET, "/").with_header("authorization", "Basic abc");
        assert_eq!(request.bearer_token(), None);

        let request = ApiRequest::new(Method::GET, "/").with_header("authorization", "Bearer");
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_from_uri() {
        let uri: http::Uri = "/api/v1/books?page=2".parse().unwrap();
        let request = ApiRequest::from_uri(Method::GET, &uri);
        assert_eq!(request.path(), "/api/v1/books");
        assert_eq!(request.query(), Some("page=2"));
    }
}
