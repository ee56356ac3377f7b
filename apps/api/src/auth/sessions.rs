//! Postgres persistence for OAuth credentials and login sessions.

use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::google::{self, OAuthSettings, TokenResponse};
use super::AuthError;
use crate::errors::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct StoredCredentials {
    pub user_email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Saves freshly issued tokens. A grant without a refresh token keeps the old one.
pub async fn store_credentials(
    pool: &PgPool,
    user_email: &str,
    token: &TokenResponse,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO oauth_credentials (user_email, access_token, refresh_token, expires_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (user_email) DO UPDATE SET
            access_token  = EXCLUDED.access_token,
            refresh_token = COALESCE(EXCLUDED.refresh_token, oauth_credentials.refresh_token),
            expires_at    = EXCLUDED.expires_at,
            updated_at    = NOW()
        "#,
    )
    .bind(user_email)
    .bind(&token.access_token)
    .bind(token.refresh_token.as_deref())
    .bind(token.expires_at(now))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_credentials(
    pool: &PgPool,
    user_email: &str,
) -> Result<Option<StoredCredentials>, sqlx::Error> {
    sqlx::query_as::<_, StoredCredentials>(
        "SELECT * FROM oauth_credentials WHERE user_email = $1",
    )
    .bind(user_email)
    .fetch_optional(pool)
    .await
}

/// Accounts that can be synced without a browser session.
pub async fn list_refreshable_accounts(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT user_email FROM oauth_credentials WHERE refresh_token IS NOT NULL ORDER BY user_email",
    )
    .fetch_all(pool)
    .await
}

pub async fn create_session(
    pool: &PgPool,
    user_email: &str,
    ttl: Duration,
) -> Result<Uuid, sqlx::Error> {
    let token = Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (token, user_email, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_email)
        .bind(Utc::now() + ttl)
        .execute(pool)
        .await?;
    info!("Created session for {user_email}");
    Ok(token)
}

pub async fn find_session_owner(pool: &PgPool, token: Uuid) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_email FROM sessions WHERE token = $1 AND expires_at > NOW()")
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn delete_session(pool: &PgPool, token: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns a usable mail access token for `user_email`.
///
/// Uses the stored token while it is valid, otherwise performs exactly one
/// refresh-token grant and persists the result.
pub async fn fresh_access_token(
    pool: &PgPool,
    http: &reqwest::Client,
    oauth: &OAuthSettings,
    user_email: &str,
) -> Result<String, AppError> {
    let now = Utc::now();
    let creds = load_credentials(pool, user_email)
        .await?
        .ok_or(AuthError::NotLoggedIn)?;

    if !google::needs_refresh(creds.expires_at, now) {
        return Ok(creds.access_token);
    }

    let refresh_token = creds.refresh_token.ok_or(AuthError::NoRefreshToken)?;
    let refreshed = google::refresh_access_token(http, oauth, &refresh_token).await?;
    store_credentials(pool, user_email, &refreshed, now).await?;
    info!("Refreshed mail access token for {user_email}");
    Ok(refreshed.access_token)
}
