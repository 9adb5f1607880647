//! Caller sessions and actors.
//!
//! The session and user domain is an external collaborator: the contract
//! layer only needs to know who is calling, in which locale, and whether a
//! user is attached. The dispatcher's session resolver turns a bearer
//! credential into a [`Session`].

use crate::Locale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Identifier of a session, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new time-ordered session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
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

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated user acting through a session.
///
/// # Example
///
/// ```
/// use tabula_core::Actor;
///
/// let admin = Actor::new(7).with_permission("users.view_private");
/// assert!(admin.has_permission("users.view_private"));
/// assert_eq!(admin.log_id(), "user:7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: i64,
    permissions: BTreeSet<String>,
}

impl Actor {
    /// Creates an actor without permissions.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            permissions: BTreeSet::new(),
        }
    }

    /// Grants a permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Returns the user ID.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Returns `true` if the permission was granted.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns a string identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("user:{}", self.id)
    }
}

/// A caller session, optionally bound to an [`Actor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    locale: Locale,
    timezone: String,
    actor: Option<Actor>,
}

impl Session {
    /// Creates an anonymous session in the given locale.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self {
            id: SessionId::new(),
            locale,
            timezone: "UTC".to_string(),
            actor: None,
        }
    }

    /// Uses a specific session ID.
    #[must_use]
    pub const fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Binds an actor to this session.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the session timezone name.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Returns the session ID.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the session locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns the timezone name.
    #[must_use]
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Returns the bound actor, if any.
    #[must_use]
    pub const fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// Returns `true` when `user_id` is the bound actor.
    #[must_use]
    pub fn is_actor(&self, user_id: i64) -> bool {
        self.actor.as_ref().is_some_and(|a| a.id() == user_id)
    }

    /// Returns a string identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> String {
        self.actor
            .as_ref()
            .map_or_else(|| format!("session:{}", self.id), Actor::log_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session() {
        let session = Session::new(Locale::En);
        assert!(session.actor().is_none());
        assert_eq!(session.locale(), Locale::En);
        assert_eq!(session.timezone(), "UTC");
        assert!(session.log_id().starts_with("session:"));
    }

    #[test]
    fn test_session_with_actor() {
        let session = Session::new(Locale::Ru).with_actor(Actor::new(42));
        assert!(session.is_actor(42));
        assert!(!session.is_actor(43));
        assert_eq!(session.log_id(), "user:42");
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_actor_permissions() {
        let actor = Actor::new(1).with_permission("a").with_permission("b");
        assert!(actor.has_permission("a"));
        assert!(!actor.has_permission("c"));
    }
}
