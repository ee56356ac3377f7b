use axum::{extract::State, Json};
use serde::Serialize;

use super::{sync_account, SyncReport};
use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SyncReport,
}

/// POST /sync
///
/// Pulls the signed-in user's recent job mail and upserts it.
pub async fn handle_sync(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<SyncResponse>, AppError> {
    let report = sync_account(&state, &session.user_email).await?;
    Ok(Json(SyncResponse {
        success: true,
        report,
    }))
}
