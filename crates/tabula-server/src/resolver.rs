//! Credential resolution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tabula_core::Session;

/// A session resolved from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    /// The session the credential belongs to.
    pub session: Session,
    /// When the credential stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl ResolvedCredential {
    /// Pairs a session with its expiration.
    #[must_use]
    pub const fn new(session: Session, expires_at: DateTime<Utc>) -> Self {
        Self {
            session,
            expires_at,
        }
    }

    /// Returns `true` once `now` has reached the expiration.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Maps bearer credentials to sessions.
///
/// Returning `Ok(None)` means the credential is unknown; the request then
/// runs anonymously. Errors are unexpected failures and end the request
/// with code 1001.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves `token`.
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<ResolvedCredential>>;
}
