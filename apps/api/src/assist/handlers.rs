//! Axum route handlers for the AI assist endpoints.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{
    analyze_email, chat_turn, draft_reply, score_resume, AssistMode, ChatPersona, DraftReply,
    EmailAnalysis, EmailContext, ResumeReport,
};
use crate::auth::AuthSession;
use crate::documents::{extract_pdf_text, read_file_field};
use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    pub mode: Option<String>,
    pub company: String,
    pub subject: String,
    pub snippet: String,
    pub context: String,
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Analysis(EmailAnalysis),
    Draft(DraftReply),
    Resume(ResumeReport),
}

#[derive(Debug, Deserialize)]
pub struct InterviewRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub persona: ChatPersona,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// JSON body runs analysis, draft or resume mode per `mode`. A multipart body
/// with a PDF `file` part always runs resume scoring.
pub async fn handle_analyze(
    State(state): State<AppState>,
    _session: AuthSession,
    request: Request,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let upload = read_file_field(multipart).await?;
        let resume_text = extract_pdf_text(upload.bytes).await?;
        let report = score_resume(state.llm()?, &resume_text).await?;
        return Ok(Json(AnalyzeResponse::Resume(report)));
    }

    let Json(body) = Json::<AnalyzeRequest>::from_request(request, &state)
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?;
    let llm = state.llm()?;
    let email = EmailContext {
        company: &body.company,
        subject: &body.subject,
        snippet: &body.snippet,
        context: &body.context,
    };

    let response = match AssistMode::from_label(body.mode.as_deref()) {
        AssistMode::Analysis => AnalyzeResponse::Analysis(analyze_email(llm, &email).await?),
        AssistMode::Draft => AnalyzeResponse::Draft(draft_reply(llm, &email).await?),
        AssistMode::Resume => AnalyzeResponse::Resume(score_resume(llm, &body.resume_text).await?),
    };
    Ok(Json(response))
}

/// POST /interview
///
/// Returns the next assistant turn. The client resends the full history each time.
pub async fn handle_interview(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    if request.company.trim().is_empty() || request.role.trim().is_empty() {
        return Err(AppError::Validation(
            "company and role are required".to_string(),
        ));
    }
    let reply = chat_turn(
        state.llm()?,
        request.persona,
        request.company.trim(),
        request.role.trim(),
        &request.messages,
    )
    .await?;
    Ok(Json(reply))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}
