//! Google OAuth2 endpoints: consent URL, code exchange, refresh, identity.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::AuthError;
use crate::errors::AppError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Read-only mail access plus identity.
pub const SCOPES: &str = "openid email profile https://www.googleapis.com/auth/gmail.readonly";

/// Seconds of slack before expiry at which an access token counts as stale.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + Duration::seconds(secs))
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

/// Consent URL. Offline access plus forced consent guarantees a refresh token.
pub fn authorization_url(settings: &OAuthSettings, state: &str) -> Result<String, AppError> {
    let url = Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", settings.client_id.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid OAuth URL: {e}")))?;
    Ok(url.into())
}

/// True when `expires_at` is unknown or within the skew window of `now`.
pub fn needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(at) => at - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
        None => true,
    }
}

pub async fn exchange_code(
    http: &Client,
    settings: &OAuthSettings,
    code: &str,
) -> Result<TokenResponse, AppError> {
    request_token(
        http,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ],
    )
    .await
}

/// Single refresh-token grant. Not retried.
pub async fn refresh_access_token(
    http: &Client,
    settings: &OAuthSettings,
    refresh_token: &str,
) -> Result<TokenResponse, AppError> {
    request_token(
        http,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
        ],
    )
    .await
}

async fn request_token(http: &Client, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
    let response = http
        .post(TOKEN_URL)
        .form(form)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("OAuth token request failed: {e}")))?;

    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        warn!("OAuth token endpoint returned {status}: {body}");
        return Err(AuthError::ProviderRejected(body).into());
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "OAuth token endpoint returned {status}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed OAuth token response: {e}")))?;
    debug!(
        "OAuth token issued (refresh token present: {})",
        token.refresh_token.is_some()
    );
    Ok(token)
}

pub async fn fetch_account_email(http: &Client, access_token: &str) -> Result<String, AppError> {
    let response = http
        .get(USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Userinfo request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(AuthError::ProviderRejected(format!(
            "userinfo returned {}",
            response.status()
        ))
        .into());
    }

    let info: UserInfo = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed userinfo response: {e}")))?;
    info.email
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AuthError::ProviderRejected("account has no email".to_string()).into())
}
