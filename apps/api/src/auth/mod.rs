//! Auth/Session: Google OAuth login, stored refresh credentials, and the
//! `AuthSession` extractor that scopes every request to one owner email.

pub mod google;
pub mod handlers;
pub mod sessions;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// How long an issued OAuth `state` value stays redeemable.
const LOGIN_STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session is unknown or has expired")]
    SessionExpired,

    #[error("No refresh token is stored for this account")]
    NoRefreshToken,

    #[error("The mail provider rejected the credentials: {0}")]
    ProviderRejected(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotLoggedIn => "NOT_LOGGED_IN",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::NoRefreshToken => "NO_REFRESH_TOKEN",
            AuthError::ProviderRejected(_) => "PROVIDER_REJECTED",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            AuthError::NotLoggedIn => "Send 'Authorization: Bearer <session token>' from /auth/callback",
            AuthError::SessionExpired => "Sign in again via /auth/login",
            AuthError::NoRefreshToken => {
                "Sign in again via /auth/login and grant offline access"
            }
            AuthError::ProviderRejected(_) => {
                "Google refused the stored token; sign in again via /auth/login"
            }
        }
    }
}

/// The signed-in owner of the current request.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: Uuid,
    pub user_email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = bearer_token(&parts.headers).ok_or(AuthError::NotLoggedIn)?;
        let token = Uuid::parse_str(raw).map_err(|_| AuthError::SessionExpired)?;
        let user_email = sessions::find_session_owner(state.db()?, token)
            .await?
            .ok_or(AuthError::SessionExpired)?;
        Ok(AuthSession { token, user_email })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Outstanding OAuth `state` values, redeemable once.
#[derive(Clone, Default)]
pub struct LoginStates {
    issued: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl LoginStates {
    pub fn issue(&self, now: DateTime<Utc>) -> String {
        let value = Uuid::new_v4().simple().to_string();
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        issued.retain(|_, at| now - *at < Duration::minutes(LOGIN_STATE_TTL_MINUTES));
        issued.insert(value.clone(), now);
        value
    }

    /// Consumes `value`; true only for a fresh, previously issued state.
    pub fn redeem(&self, value: &str, now: DateTime<Utc>) -> bool {
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        match issued.remove(value) {
            Some(at) => now - at < Duration::minutes(LOGIN_STATE_TTL_MINUTES),
            None => false,
        }
    }
}
