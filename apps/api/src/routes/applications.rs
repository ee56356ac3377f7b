//! Axum route handlers for the owner's application records.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationStatus};
use crate::state::AppState;
use crate::store::DetailsUpdate;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

/// GET /applications
pub async fn handle_list(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<ApplicationRecord>>, AppError> {
    let records = state.store()?.list_for_owner(&session.user_email).await?;
    Ok(Json(records))
}

/// PATCH /applications/:id
///
/// Corrects the company and/or role the classifier guessed.
pub async fn handle_update_details(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<DetailsUpdate>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let details = validate_details(request)?;
    let record = state
        .store()?
        .update_details(id, &session.user_email, &details)
        .await?;
    Ok(Json(record))
}

/// PATCH /applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let record = state
        .store()?
        .update_status(id, &session.user_email, request.status)
        .await?;
    Ok(Json(record))
}

/// PATCH /applications/:id/notes
pub async fn handle_save_notes(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let record = state
        .store()?
        .save_notes(id, &session.user_email, &request.notes)
        .await?;
    Ok(Json(record))
}

/// DELETE /applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store()?.delete(id, &session.user_email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Trims both fields; at least one must be present and none may be blank.
fn validate_details(request: DetailsUpdate) -> Result<DetailsUpdate, AppError> {
    let clean = |field: &str, value: Option<String>| match value {
        Some(v) if v.trim().is_empty() => Err(AppError::Validation(format!(
            "{field} cannot be empty"
        ))),
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    };
    let details = DetailsUpdate {
        company: clean("company", request.company)?,
        role: clean("role", request.role)?,
    };
    if details.company.is_none() && details.role.is_none() {
        return Err(AppError::Validation(
            "Provide company and/or role".to_string(),
        ));
    }
    Ok(details)
}
