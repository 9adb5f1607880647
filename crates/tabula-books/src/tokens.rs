//! Bearer tokens bound to sessions.
//!
//! Tokens are opaque uuid v7 strings. An access token authenticates every
//! method until its expiration date; past that date it still resolves, as
//! expired, until the refresh lifetime ends, so callers get code 1003 and
//! know to refresh. A refresh token always resolves as expired, which only
//! the refresh method accepts.

use crate::users::UserDirectory;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tabula_config::AuthConfig;
use tabula_core::{Session, SessionId};
use tabula_server::{ResolvedCredential, SessionResolver};
use tracing::debug;
use uuid::Uuid;

/// Purpose of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Authenticates regular calls.
    Access,
    /// Exchanges for a new pair.
    Refresh,
}

impl TokenType {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// A token handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque value.
    pub value: String,
    /// When the token stops being accepted for its purpose.
    pub expiration_date: DateTime<Utc>,
}

/// An access token and its refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensPair {
    /// Access token.
    pub access_token: IssuedToken,
    /// Refresh token.
    pub refresh_token: IssuedToken,
}

#[derive(Debug, Clone)]
struct TokenRecord {
    token_type: TokenType,
    session: Session,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-memory token registry and session resolver.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenRecord>>,
    users: Arc<UserDirectory>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenStore {
    /// Creates a store with the given lifetimes.
    #[must_use]
    pub fn new(
        users: Arc<UserDirectory>,
        access_ttl: std::time::Duration,
        refresh_ttl: std::time::Duration,
    ) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            users,
            access_ttl: to_chrono(access_ttl),
            refresh_ttl: to_chrono(refresh_ttl),
        }
    }

    /// Creates a store with lifetimes from `auth`.
    #[must_use]
    pub fn from_config(auth: &AuthConfig, users: Arc<UserDirectory>) -> Self {
        Self::new(
            users,
            std::time::Duration::from_secs(auth.access_token_ttl_secs),
            std::time::Duration::from_secs(auth.refresh_token_ttl_secs),
        )
    }

    /// Issues a fresh pair for `session`.
    pub fn issue_pair(&self, session: &Session, now: DateTime<Utc>) -> TokensPair {
        let access = self.issue(TokenType::Access, session, now, self.access_ttl);
        let refresh = self.issue(TokenType::Refresh, session, now, self.refresh_ttl);
        debug!(session = %session.log_id(), "issued token pair");
        TokensPair {
            access_token: access,
            refresh_token: refresh,
        }
    }

    fn issue(
        &self,
        token_type: TokenType,
        session: &Session,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> IssuedToken {
        let value = Uuid::now_v7().to_string();
        let expires_at = now + ttl;
        self.tokens.write().insert(
            value.clone(),
            TokenRecord {
                token_type,
                session: session.clone(),
                issued_at: now,
                expires_at,
            },
        );
        IssuedToken {
            value,
            expiration_date: expires_at,
        }
    }

    /// Drops every token of `session`. Returns how many were removed.
    pub fn revoke_session(&self, session: SessionId) -> usize {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, record| record.session.id() != session);
        before - tokens.len()
    }

    /// The type of a known token.
    #[must_use]
    pub fn token_type(&self, token: &str) -> Option<TokenType> {
        self.tokens.read().get(token).map(|r| r.token_type)
    }

    /// Resolves `token` as of `now`, recording the request for the session's
    /// user.
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<ResolvedCredential> {
        let record = self.tokens.read().get(token).cloned()?;
        let reported_expiry = match record.token_type {
            TokenType::Access => {
                if now >= record.issued_at + self.refresh_ttl {
                    return None;
                }
                record.expires_at
            }
            TokenType::Refresh => {
                if now >= record.expires_at {
                    return None;
                }
                record.issued_at
            }
        };

        if let Some(actor) = record.session.actor() {
            self.users.touch(actor.id(), now);
        }
        Some(ResolvedCredential::new(record.session, reported_expiry))
    }
}

#[async_trait]
impl SessionResolver for TokenStore {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<ResolvedCredential>> {
        Ok(self.resolve_at(token, Utc::now()))
    }
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or_else(|_| Duration::days(365 * 100))
}
