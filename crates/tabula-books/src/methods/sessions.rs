//! Session and token methods.

use crate::models::{JwtTokensPairModel, SessionInfoModel};
use crate::tokens::TokenStore;
use crate::users::UserDirectory;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tabula_contract::prelude::*;
use tabula_core::{codes, ApiError, Locale, Session};
use tracing::info;

/// Name of the token refresh method.
pub const REFRESH_METHOD: &str = "tokens/postRefresh";

const LANGUAGE_CODE: &str = "language_code";
const USER_ID: &str = "user_id";

/// `GET /sessions/info`: the caller's session.
pub struct GetSessionInfo {
    users: Arc<UserDirectory>,
}

impl GetSessionInfo {
    /// Looks users up in `users`.
    #[must_use]
    pub const fn new(users: Arc<UserDirectory>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl MutableMethod for GetSessionInfo {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("sessions/getInfo")
            .description("Информация о текущей сессии")
            .result(FieldDeclaration::object(SessionInfoModel::model_ref(), false))
            .build()
    }

    async fn handle(&self, input: &TypedInput, session: Option<&Session>) -> MethodResult {
        let info = match session {
            Some(session) => {
                let user = session.actor().and_then(|actor| self.users.get(actor.id()));
                SessionInfoModel::new(session.clone(), user, None)
            }
            None => SessionInfoModel::new(Session::new(input.locale()), None, None),
        };
        Ok(Some(ModelValue::mutable(info).into()))
    }
}

/// `POST /sessions`: opens a session and issues its tokens.
pub struct PostSessions {
    users: Arc<UserDirectory>,
    tokens: Arc<TokenStore>,
}

impl PostSessions {
    /// Binds sessions to `users` and issues tokens from `tokens`.
    #[must_use]
    pub const fn new(users: Arc<UserDirectory>, tokens: Arc<TokenStore>) -> Self {
        Self { users, tokens }
    }
}

#[async_trait]
impl ImmutableMethod for PostSessions {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder("postSessions")
            .description("Создание сессии")
            .parameter(
                LANGUAGE_CODE,
                ParameterDeclaration::enumeration(EnumDomain::of::<Locale>(), Requirement::Optional)
                    .description("Код языка"),
            )
            .parameter(
                USER_ID,
                ParameterDeclaration::integer(Requirement::Optional).description("ID пользователя"),
            )
            .result(FieldDeclaration::object(SessionInfoModel::model_ref(), false))
            .build()
    }

    async fn handle(&self, input: &TypedInput) -> MethodResult {
        let locale = input
            .get_enum::<Locale>(LANGUAGE_CODE)
            .unwrap_or_else(|| input.locale());
        let user = input.get_int(USER_ID).and_then(|id| self.users.get(id));

        let mut session = Session::new(locale);
        if let Some(user) = &user {
            session = session.with_actor(user.actor());
        }
        let tokens = self.tokens.issue_pair(&session, Utc::now());
        info!(session = %session.log_id(), locale = locale.code(), "session opened");

        Ok(Some(
            ModelValue::mutable(SessionInfoModel::new(session, user, Some(tokens))).into(),
        ))
    }
}

/// `POST /tokens/refresh`: replaces the session's tokens.
pub struct PostRefresh {
    tokens: Arc<TokenStore>,
}

impl PostRefresh {
    /// Issues tokens from `tokens`.
    #[must_use]
    pub const fn new(tokens: Arc<TokenStore>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl MutableMethod for PostRefresh {
    fn declaration(&self) -> MethodDeclaration {
        MethodDeclaration::builder(REFRESH_METHOD)
            .description("Обновление токенов")
            .result(FieldDeclaration::object(JwtTokensPairModel::model_ref(), false))
            .possible_errors([codes::TOKEN_EXPIRED])
            .build()
    }

    async fn handle(&self, _input: &TypedInput, session: Option<&Session>) -> MethodResult {
        let session = session.ok_or_else(|| ApiError::only_code(codes::TOKEN_EXPIRED))?;
        let revoked = self.tokens.revoke_session(session.id());
        let pair = self.tokens.issue_pair(session, Utc::now());
        info!(session = %session.log_id(), revoked, "tokens refreshed");
        Ok(Some(ModelValue::immutable(JwtTokensPairModel(pair)).into()))
    }
}
