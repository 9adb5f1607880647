//! Request context types.
//!
//! The [`RequestContext`] carries per-request state from the dispatcher into
//! the serializer and the logs.

use crate::{Locale, Session};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use tabula_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request state owned by the dispatcher.
///
/// # Example
///
/// ```
/// use tabula_core::{Locale, RequestContext};
///
/// let ctx = RequestContext::new(Locale::En).with_method("getBooks");
/// assert_eq!(ctx.method(), Some("getBooks"));
/// assert!(ctx.session().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    locale: Locale,
    session: Option<Session>,
    method: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self {
            request_id: RequestId::new(),
            locale,
            session: None,
            method: None,
            started_at: Instant::now(),
        }
    }

    /// Creates a mock context for testing purposes.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(Locale::default())
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Sets the request locale.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Returns the attached session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Attaches a session.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Returns a new context with the given session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns the resolved method name.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Records the resolved method name.
    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = Some(method.into());
    }

    /// Returns a new context with the given method name.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Elapsed time in fractional milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_display() {
        let display = RequestId::new().to_string();
        assert_eq!(display.len(), 36);
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_context_session() {
        let mut ctx = RequestContext::mock();
        assert!(ctx.session().is_none());
        ctx.set_session(Session::new(Locale::En).with_actor(Actor::new(5)));
        assert!(ctx.session().is_some_and(|s| s.is_actor(5)));
    }

    #[test]
    fn test_context_elapsed() {
        let ctx = RequestContext::mock();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed_ms() >= 5.0);
    }
}
