use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{google, sessions, AuthSession};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub session_token: Uuid,
    pub email: String,
}

/// GET /auth/login
pub async fn handle_login(State(state): State<AppState>) -> Result<Json<LoginResponse>, AppError> {
    let oauth = state.oauth()?;
    let login_state = state.login_states.issue(Utc::now());
    let url = google::authorization_url(&oauth, &login_state)?;
    Ok(Json(LoginResponse {
        url,
        state: login_state,
    }))
}

/// GET /auth/callback
///
/// Exchanges the authorization code, stores the credentials and opens a session.
pub async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("Sign-in was not completed: {error}")));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Missing authorization code".to_string()))?;
    let login_state = query.state.unwrap_or_default();
    if !state.login_states.redeem(&login_state, Utc::now()) {
        return Err(AppError::Validation(
            "Unknown or expired login state; start again at /auth/login".to_string(),
        ));
    }

    let oauth = state.oauth()?;
    let pool = state.db()?;

    let token = google::exchange_code(&state.http, &oauth, &code).await?;
    let email = google::fetch_account_email(&state.http, &token.access_token).await?;
    sessions::store_credentials(pool, &email, &token, Utc::now()).await?;

    let session_token = sessions::create_session(pool, &email, state.config.session_ttl).await?;
    info!("{email} signed in");

    Ok(Json(CallbackResponse {
        session_token,
        email,
    }))
}

/// POST /auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode, AppError> {
    sessions::delete_session(state.db()?, session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
