//! Axum route handlers for the dashboard and Kanban board.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BoardColumn, DashboardView, StatusFilter, ViewMode};
use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationStatus};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub filter: StatusFilter,
    pub search: String,
    pub view: ViewMode,
    pub selected: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BoardMoveRequest {
    pub id: Uuid,
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize)]
pub struct BoardMoveResponse<'a> {
    pub card: &'a ApplicationRecord,
    pub board: Vec<BoardColumn<'a>>,
}

async fn load_view(state: &AppState, owner: &str) -> Result<DashboardView, AppError> {
    let applications = state.store()?.list_for_owner(owner).await?;
    Ok(DashboardView::new(applications))
}

/// GET /dashboard?filter=&search=&view=&selected=
///
/// KPIs plus the sections of the requested view mode.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let mut view = load_view(&state, &session.user_email).await?;
    view.filter = query.filter;
    view.search = query.search;
    view.view = query.view;
    view.selected = query.selected;
    Ok(Json(view.snapshot()).into_response())
}

/// POST /board/move
///
/// Moves a card to any column. The write is confirmed before the board is
/// returned; a failed write answers with the error.
pub async fn handle_board_move(
    State(state): State<AppState>,
    session: AuthSession,
    Json(request): Json<BoardMoveRequest>,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let mut view = load_view(&state, &session.user_email).await?;
    view.view = ViewMode::Board;

    let saved = view
        .move_card(store, &session.user_email, request.id, request.status)
        .await?;
    let card = view.find(saved.id).unwrap_or(&saved);
    Ok(Json(BoardMoveResponse {
        card,
        board: view.board(),
    })
    .into_response())
}
