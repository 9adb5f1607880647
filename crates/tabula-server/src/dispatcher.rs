//! The request dispatcher.
//!
//! A request goes through `resolve → authenticate → validate → invoke →
//! serialize → respond`. Any failure on the way short-circuits into an error
//! envelope; nothing escapes [`Dispatcher::dispatch`].

use crate::envelope::Envelope;
use crate::request::{ApiRequest, ApiResponse};
use crate::resolver::SessionResolver;
use crate::routing::{self, Route, ID_PARAMETER};
use crate::Serializer;
use chrono::Utc;
use futures_util::FutureExt;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;
use tabula_contract::{ApiMethod, MethodRegistry, TypedInput};
use tabula_core::{
    codes, ApiError, ContractViolation, DescriptionTable, ErrorDescriptions, Failure, Locale,
    RequestContext, RequestId, Session,
};
use tabula_telemetry::metrics::{
    record_contract_error, record_contract_violation, record_request, UNKNOWN_METHOD,
};

/// Header carrying the request ID on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Default API base path.
pub const DEFAULT_BASE_PATH: &str = "/api/v1";

/// Default refresh method, exempt from the token expiry check.
pub const DEFAULT_REFRESH_METHOD: &str = "tokens/postRefresh";

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Path prefix of every API method.
    pub base_path: String,
    /// Locale used when neither the session nor the client names one.
    pub default_locale: Locale,
    /// Method callable with an expired credential.
    pub refresh_method: String,
    /// Embed non-contract failures in `service_info.throwables`.
    pub expose_throwables: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            default_locale: Locale::default(),
            refresh_method: DEFAULT_REFRESH_METHOD.to_string(),
            expose_throwables: false,
        }
    }
}

impl DispatcherConfig {
    /// Sets the base path.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the default locale.
    #[must_use]
    pub const fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    /// Sets the refresh method.
    #[must_use]
    pub fn with_refresh_method(mut self, method: impl Into<String>) -> Self {
        self.refresh_method = method.into();
        self
    }

    /// Enables or disables throwable exposure.
    #[must_use]
    pub const fn with_expose_throwables(mut self, expose: bool) -> Self {
        self.expose_throwables = expose;
        self
    }
}

/// Runs requests against a [`MethodRegistry`].
///
/// # Example
///
/// ```
/// use http::Method;
/// use tabula_contract::MethodRegistry;
/// use tabula_server::{ApiRequest, Dispatcher};
///
/// # tokio_test::block_on(async {
/// let dispatcher = Dispatcher::new(MethodRegistry::new());
/// let response = dispatcher
///     .dispatch(ApiRequest::new(Method::GET, "/api/v1/books"))
///     .await;
/// assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    descriptions: Arc<dyn DescriptionTable>,
    resolver: Option<Arc<dyn SessionResolver>>,
    config: DispatcherConfig,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.registry.len())
            .field("resolver", &self.resolver.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in error descriptions and no
    /// session resolver.
    pub fn new(registry: impl Into<Arc<MethodRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            descriptions: Arc::new(ErrorDescriptions::with_builtin()),
            resolver: None,
            config: DispatcherConfig::default(),
        }
    }

    /// Uses `descriptions` for `errors[].description`.
    #[must_use]
    pub fn with_descriptions(mut self, descriptions: Arc<dyn DescriptionTable>) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// Resolves bearer credentials through `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn SessionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Runs one request to completion.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let mut ctx = RequestContext::new(self.config.default_locale);
        tabula_telemetry::log_request_start!(ctx.request_id(), request.method(), request.path());

        let outcome = self.run(&request, &mut ctx).await;
        let generation_ms = ctx.elapsed_ms();
        let method = ctx.method().unwrap_or(UNKNOWN_METHOD).to_string();

        let (status, envelope) = match outcome {
            Ok(result) => (StatusCode::OK, Envelope::success(result, generation_ms)),
            Err(failure) => self.failure_envelope(&ctx, &method, failure, generation_ms),
        };

        record_request(&method, envelope.ok, ctx.elapsed());
        tabula_telemetry::log_request_complete!(
            ctx.request_id(),
            method,
            status.as_u16(),
            generation_ms
        );

        let body = serde_json::to_vec(&envelope).unwrap_or_else(|err| {
            tracing::error!(error = %err, "envelope serialization failed");
            br#"{"ok":false,"result":null,"errors":[],"service_info":{"generation_ms":0,"throwables":[]}}"#
                .to_vec()
        });
        ApiResponse::new(status, response_headers(ctx.request_id()), body)
    }

    async fn run(&self, request: &ApiRequest, ctx: &mut RequestContext) -> Result<Value, Failure> {
        let route = routing::strip_base_path(&self.config.base_path, request.path())
            .and_then(|relative| routing::resolve(request.method(), relative))
            .ok_or_else(|| ApiError::only_code(codes::METHOD_NOT_FOUND))?;
        let method = self
            .registry
            .get(&route.method_name)
            .ok_or_else(|| ApiError::only_code(codes::METHOD_NOT_FOUND))?;
        ctx.set_method(method.name());
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = method.name(),
            id = ?route.id,
            "method resolved"
        );

        let session = self.authenticate(request, method).await?;
        let locale = session
            .as_ref()
            .map(Session::locale)
            .or_else(|| request.accept_language().and_then(Locale::from_accept_language))
            .unwrap_or(self.config.default_locale);
        ctx.set_locale(locale);
        if let Some(session) = &session {
            ctx.set_session(session.clone());
        }

        let declaration = method.declaration();
        if declaration.only_for_users() && session.as_ref().and_then(Session::actor).is_none() {
            return Err(ApiError::only_code(codes::USERS_ONLY).into());
        }

        let input = TypedInput::new(
            declaration.all_parameters(),
            &input_data(request, &route),
            locale,
            declaration.selection(),
        )
        .into_result()?;

        let output = AssertUnwindSafe(method.invoke(&input, session.as_ref()))
            .catch_unwind()
            .await
            .map_err(|payload| panicked(method.name(), payload.as_ref()))??;

        let serializer = Serializer::new(session.as_ref());
        match (output, declaration.result()) {
            (Some(value), Some(field)) => {
                Ok(serializer.serialize_field(field, &value, method.name(), "result")?)
            }
            (None, Some(field)) if !field.is_nullable() => {
                Err(ContractViolation::UnexpectedNull {
                    method: method.name().to_string(),
                }
                .into())
            }
            (Some(value), None) if !value.is_null() => Err(ContractViolation::UnexpectedResult {
                method: method.name().to_string(),
            }
            .into()),
            _ => Ok(Value::Null),
        }
    }

    /// Resolves the bearer credential into a session.
    async fn authenticate(
        &self,
        request: &ApiRequest,
        method: &ApiMethod,
    ) -> Result<Option<Session>, Failure> {
        let (Some(token), Some(resolver)) = (request.bearer_token(), &self.resolver) else {
            return Ok(None);
        };
        let Some(credential) = resolver.resolve(token).await? else {
            tracing::debug!("unknown credential ignored");
            return Ok(None);
        };
        if credential.is_expired(Utc::now()) && method.name() != self.config.refresh_method {
            return Err(ApiError::only_code(codes::TOKEN_EXPIRED).into());
        }
        Ok(Some(credential.session))
    }

    fn failure_envelope(
        &self,
        ctx: &RequestContext,
        method: &str,
        failure: Failure,
        generation_ms: f64,
    ) -> (StatusCode, Envelope) {
        let status = failure.status_code();
        if failure.is_api() {
            tracing::info!(
                request_id = %ctx.request_id(),
                method,
                error = %failure,
                "contract error"
            );
        } else {
            tabula_telemetry::log_request_error!(ctx.request_id(), method, failure);
        }

        let error = failure.into_api_error();
        let (envelope, throwables) = Envelope::failure(
            &error,
            self.descriptions.as_ref(),
            generation_ms,
            self.config.expose_throwables,
        );
        for throwable in &throwables {
            record_contract_violation();
            tracing::error!(
                request_id = %ctx.request_id(),
                class = %throwable.class,
                trace = ?throwable.trace,
                "{}",
                throwable.message
            );
        }
        for code in envelope.error_codes() {
            record_contract_error(code);
        }
        (status, envelope)
    }
}

/// Turns a panic raised inside a method into an unexpected failure.
fn panicked(method: &str, payload: &(dyn Any + Send)) -> Failure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("method {method} panicked: {message}").into()
}

/// Raw input for the method, with the path ID merged in.
fn input_data(request: &ApiRequest, route: &Route) -> serde_json::Map<String, Value> {
    let mut data = request.input_data();
    if let Some(id) = route.id {
        data.insert(ID_PARAMETER.to_string(), Value::from(id));
    }
    data
}

/// Headers sent with every API response.
#[must_use]
pub fn response_headers(request_id: RequestId) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    if let Ok(expires) = HeaderValue::from_str(&httpdate::fmt_http_date(SystemTime::now())) {
        headers.insert(header::EXPIRES, expires);
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    if let Ok(id) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), id);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolvedCredential;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use http::Method;
    use serde_json::json;
    use tabula_contract::prelude::*;
    use tabula_core::Actor;

    struct Echo;

    #[async_trait]
    impl ImmutableMethod for Echo {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getEcho")
                .parameter("name", ParameterDeclaration::string(Requirement::Required(3002)))
                .parameter("times", ParameterDeclaration::integer(Requirement::Optional))
                .result(FieldDeclaration::string(false))
                .build()
        }

        async fn handle(&self, input: &TypedInput) -> MethodResult {
            let times = usize::try_from(input.get_int("times").unwrap_or(1)).unwrap_or(1);
            Ok(Some(input.require_string("name").repeat(times).into()))
        }
    }

    struct Item;

    #[async_trait]
    impl ImmutableMethod for Item {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getItemsWithId")
                .parameter("id", ParameterDeclaration::integer(Requirement::Required(3001)))
                .result(FieldDeclaration::integer(false))
                .build()
        }

        async fn handle(&self, input: &TypedInput) -> MethodResult {
            Ok(Some(input.require_int("id").into()))
        }
    }

    struct WrongType;

    #[async_trait]
    impl ImmutableMethod for WrongType {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getWrong")
                .result(FieldDeclaration::string(false))
                .build()
        }

        async fn handle(&self, _input: &TypedInput) -> MethodResult {
            Ok(Some(OutputValue::Int(1)))
        }
    }

    struct Missing;

    #[async_trait]
    impl ImmutableMethod for Missing {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getMissing")
                .result(FieldDeclaration::string(false))
                .build()
        }

        async fn handle(&self, _input: &TypedInput) -> MethodResult {
            Ok(None)
        }
    }

    struct Crashing;

    #[async_trait]
    impl ImmutableMethod for Crashing {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getCrash").build()
        }

        async fn handle(&self, _input: &TypedInput) -> MethodResult {
            Err(anyhow::anyhow!("store unavailable").into())
        }
    }

    struct Misused;

    #[async_trait]
    impl ImmutableMethod for Misused {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("getMisuse")
                .parameter("n", ParameterDeclaration::integer(Requirement::Optional))
                .result(FieldDeclaration::integer(false))
                .build()
        }

        async fn handle(&self, input: &TypedInput) -> MethodResult {
            Ok(Some(input.require_int("n").into()))
        }
    }

    struct PostNote;

    #[async_trait]
    impl MutableMethod for PostNote {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("postNotes").only_for_users().build()
        }

        async fn handle(&self, _input: &TypedInput, _session: Option<&Session>) -> MethodResult {
            Ok(None)
        }
    }

    struct Refresh;

    #[async_trait]
    impl MutableMethod for Refresh {
        fn declaration(&self) -> MethodDeclaration {
            MethodDeclaration::builder("tokens/postRefresh")
                .result(FieldDeclaration::integer(false))
                .possible_errors([codes::TOKEN_EXPIRED])
                .build()
        }

        async fn handle(&self, _input: &TypedInput, session: Option<&Session>) -> MethodResult {
            let user = session
                .and_then(Session::actor)
                .ok_or_else(|| ApiError::only_code(codes::TOKEN_EXPIRED))?;
            Ok(Some(user.id().into()))
        }
    }

    struct Tokens;

    #[async_trait]
    impl SessionResolver for Tokens {
        async fn resolve(&self, token: &str) -> anyhow::Result<Option<ResolvedCredential>> {
            let session = Session::new(Locale::En).with_actor(Actor::new(7));
            let now = Utc::now();
            Ok(match token {
                "live" => Some(ResolvedCredential::new(session, now + Duration::hours(1))),
                "stale" => Some(ResolvedCredential::new(session, now - Duration::hours(1))),
                "guest" => Some(ResolvedCredential::new(
                    Session::new(Locale::Kk),
                    DateTime::<Utc>::MAX_UTC,
                )),
                "broken" => anyhow::bail!("token store offline"),
                _ => None,
            })
        }
    }

    fn dispatcher() -> Dispatcher {
        let registry = MethodRegistry::new()
            .with_immutable(Echo)
            .with_immutable(Item)
            .with_immutable(WrongType)
            .with_immutable(Missing)
            .with_immutable(Crashing)
            .with_immutable(Misused)
            .with_mutable(PostNote)
            .with_mutable(Refresh);
        Dispatcher::new(registry).with_resolver(Arc::new(Tokens))
    }

    fn envelope(response: &ApiResponse) -> Envelope {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = dispatcher()
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/echo").with_query("name=ab&times=2"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope(&response);
        assert!(envelope.ok);
        assert_eq!(envelope.result, json!("abab"));
        assert!(envelope.errors.is_empty());
    }

    #[tokio::test]
    async fn test_response_headers() {
        let response = dispatcher()
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/echo").with_query("name=a"))
            .await;
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(headers.contains_key(header::EXPIRES));
        assert_eq!(headers[REQUEST_ID_HEADER].len(), 36);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        for path in ["/api/v1/nothing", "/api/v1/Echo", "/api/v1/", "/other/echo"] {
            let response = dispatcher()
                .dispatch(ApiRequest::new(Method::GET, path))
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(envelope(&response).error_codes(), vec![codes::METHOD_NOT_FOUND]);
        }
    }

    #[tokio::test]
    async fn test_path_id_overrides_raw_id() {
        let response = dispatcher()
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/items/42").with_query("id=5"))
            .await;
        assert_eq!(envelope(&response).result, json!(42));
    }

    #[tokio::test]
    async fn test_missing_required_parameter() {
        let response = dispatcher()
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/echo"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let envelope = envelope(&response);
        assert!(!envelope.ok);
        assert!(envelope.result.is_null());
        assert_eq!(envelope.errors[0]["code"], json!(3002));
        assert_eq!(envelope.errors[0]["input_field"], json!("name"));
    }

    #[tokio::test]
    async fn test_violation_is_service_unavailable() {
        let response = dispatcher()
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/wrong"))
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let envelope = envelope(&response);
        assert_eq!(envelope.error_codes(), vec![codes::INTERNAL_SERVER_ERROR]);
        assert!(envelope.service_info.throwables.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_null_result() {
        let dispatcher = dispatcher()
            .with_config(DispatcherConfig::default().with_expose_throwables(true));
        let response = dispatcher
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/missing"))
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let throwables = envelope(&response).service_info.throwables;
        assert_eq!(throwables.len(), 1);
        assert_eq!(throwables[0].message, "method getMissing returns null");
    }

    #[tokio::test]
    async fn test_panicking_method_is_service_unavailable() {
        let dispatcher = dispatcher()
            .with_config(DispatcherConfig::default().with_expose_throwables(true));
        let response = dispatcher
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/misuse").with_query("n=1"))
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let envelope = envelope(&response);
        assert!(!envelope.ok);
        assert_eq!(envelope.error_codes(), vec![codes::INTERNAL_SERVER_ERROR]);
        let throwable = &envelope.service_info.throwables[0];
        assert_eq!(throwable.class, "UnexpectedFailure");
        assert!(throwable.message.contains("require_int(\"n\") on an optional parameter"));

        let after = dispatcher
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/echo").with_query("name=a"))
            .await;
        assert_eq!(after.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_throwables_exposed_on_request() {
        let dispatcher = dispatcher()
            .with_config(DispatcherConfig::default().with_expose_throwables(true));
        let response = dispatcher
            .dispatch(ApiRequest::new(Method::GET, "/api/v1/crash"))
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let envelope = envelope(&response);
        assert_eq!(envelope.error_codes(), vec![codes::INTERNAL_SERVER_ERROR]);
        assert_eq!(envelope.service_info.throwables[0].class, "UnexpectedFailure");
        assert_eq!(envelope.service_info.throwables[0].message, "store unavailable");
    }

    #[tokio::test]
    async fn test_resolver_failure_is_internal() {
        let response = dispatcher()
            .dispatch(
                ApiRequest::new(Method::GET, "/api/v1/echo")
                    .with_query("name=a")
                    .with_header("authorization", "Bearer broken"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_users_only() {
        let anonymous = dispatcher()
            .dispatch(ApiRequest::new(Method::POST, "/api/v1/notes"))
            .await;
        assert_eq!(envelope(&anonymous).error_codes(), vec![codes::USERS_ONLY]);

        let guest = dispatcher()
            .dispatch(
                ApiRequest::new(Method::POST, "/api/v1/notes")
                    .with_header("authorization", "Bearer guest"),
            )
            .await;
        assert_eq!(envelope(&guest).error_codes(), vec![codes::USERS_ONLY]);

        let user = dispatcher()
            .dispatch(
                ApiRequest::new(Method::POST, "/api/v1/notes")
                    .with_header("authorization", "Bearer live"),
            )
            .await;
        assert_eq!(user.status(), StatusCode::OK);
        assert!(envelope(&user).result.is_null());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let response = dispatcher()
            .dispatch(
                ApiRequest::new(Method::POST, "/api/v1/notes")
                    .with_header("authorization", "Bearer stale"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope(&response).error_codes(), vec![codes::TOKEN_EXPIRED]);
    }

    #[tokio::test]
    async fn test_refresh_method_accepts_expired_token() {
        let response = dispatcher()
            .dispatch(
                ApiRequest::new(Method::POST, "/api/v1/tokens/refresh")
                    .with_header("authorization", "Bearer stale"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(envelope(&response).result, json!(7));
    }

    #[tokio::test]
    async fn test_unknown_token_runs_anonymously() {
        let response = dispatcher()
            .dispatch(
                ApiRequest::new(Method::POST, "/api/v1/tokens/refresh")
                    .with_header("authorization", "Bearer nobody"),
            )
            .await;
        assert_eq!(envelope(&response).error_codes(), vec![codes::TOKEN_EXPIRED]);
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let dispatcher =
            dispatcher().with_config(DispatcherConfig::default().with_base_path("/rpc"));
        let response = dispatcher
            .dispatch(ApiRequest::new(Method::GET, "/rpc/echo").with_query("name=x"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
