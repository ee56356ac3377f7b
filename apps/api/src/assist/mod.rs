//! AI Assist: email analysis, reply drafting, resume scoring and the
//! interview / negotiation chat. Every call goes through `LlmClient`; any
//! upstream or JSON failure is terminal for the request.

pub mod handlers;
pub mod prompts;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{ChatMessage, ChatRole, CompletionOptions, LlmClient};
use prompts::*;

/// Characters of resume text sent to the scoring prompt.
pub const RESUME_CHAR_BUDGET: usize = 15_000;

const CHAT_MAX_TOKENS: u32 = 500;
const CHAT_TEMPERATURE: f32 = 0.7;

const STRENGTH_COUNT: usize = 3;
const WEAKNESS_COUNT: usize = 3;
const MISSING_KEYWORD_COUNT: usize = 5;

/// Which JSON mode `/analyze` runs. Unknown labels fall back to analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssistMode {
    #[default]
    Analysis,
    Draft,
    Resume,
}

impl AssistMode {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("draft") => AssistMode::Draft,
            Some("resume") => AssistMode::Resume,
            _ => AssistMode::Analysis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[serde(alias = "positive", alias = "POSITIVE")]
    Positive,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
    #[serde(alias = "negative", alias = "NEGATIVE")]
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAnalysis {
    pub summary: String,
    #[serde(deserialize_with = "percent")]
    pub probability: u8,
    pub tone: Tone,
    pub tips: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftReply {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeReport {
    #[serde(deserialize_with = "percent")]
    pub score: u8,
    pub headline: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    pub improvement_plan: String,
}

impl ResumeReport {
    /// Trims list fields to the counts the prompt asks for.
    fn bounded(mut self) -> Self {
        self.strengths.truncate(STRENGTH_COUNT);
        self.weaknesses.truncate(WEAKNESS_COUNT);
        self.missing_keywords.truncate(MISSING_KEYWORD_COUNT);
        self
    }
}

/// Accepts any JSON number and clamps it into 0..=100.
fn percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Inputs shared by the analysis and draft modes.
#[derive(Debug, Clone, Default)]
pub struct EmailContext<'a> {
    pub company: &'a str,
    pub subject: &'a str,
    pub snippet: &'a str,
    pub context: &'a str,
}

/// First `budget` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn build_analysis_prompt(email: &EmailContext<'_>) -> String {
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{company}", email.company)
        .replace("{subject}", email.subject)
        .replace("{snippet}", email.snippet)
}

pub fn build_draft_prompt(email: &EmailContext<'_>) -> String {
    DRAFT_PROMPT_TEMPLATE
        .replace("{context}", email.context)
        .replace("{company}", email.company)
        .replace("{snippet}", email.snippet)
}

pub fn build_resume_prompt(resume_text: &str) -> String {
    RESUME_PROMPT_TEMPLATE.replace(
        "{resume_text}",
        truncate_chars(resume_text, RESUME_CHAR_BUDGET),
    )
}

pub async fn analyze_email(
    llm: &LlmClient,
    email: &EmailContext<'_>,
) -> Result<EmailAnalysis, AppError> {
    if email.subject.trim().is_empty() && email.snippet.trim().is_empty() {
        return Err(AppError::Validation(
            "subject or snippet is required for analysis".to_string(),
        ));
    }
    let prompt = build_analysis_prompt(email);
    Ok(llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?)
}

pub async fn draft_reply(llm: &LlmClient, email: &EmailContext<'_>) -> Result<DraftReply, AppError> {
    if email.snippet.trim().is_empty() {
        return Err(AppError::Validation(
            "snippet is required to draft a reply".to_string(),
        ));
    }
    let prompt = build_draft_prompt(email);
    Ok(llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?)
}

pub async fn score_resume(llm: &LlmClient, resume_text: &str) -> Result<ResumeReport, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume text cannot be empty".to_string()));
    }
    let total = resume_text.chars().count();
    if total > RESUME_CHAR_BUDGET {
        info!("Resume text truncated from {total} to {RESUME_CHAR_BUDGET} chars");
    }
    let prompt = build_resume_prompt(resume_text);
    let report: ResumeReport = llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
    Ok(report.bounded())
}

/// Which persona answers the chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ChatPersona {
    #[default]
    Interviewer,
    NegotiationCoach,
}

impl From<String> for ChatPersona {
    fn from(kind: String) -> Self {
        if kind.trim().eq_ignore_ascii_case("salary") {
            ChatPersona::NegotiationCoach
        } else {
            ChatPersona::Interviewer
        }
    }
}

pub fn build_persona_system(persona: ChatPersona, company: &str, role: &str) -> String {
    let template = match persona {
        ChatPersona::Interviewer => INTERVIEWER_SYSTEM_TEMPLATE,
        ChatPersona::NegotiationCoach => NEGOTIATION_COACH_SYSTEM_TEMPLATE,
    };
    template
        .replace("{company}", company)
        .replace("{role}", role)
}

/// The completion API needs a leading user turn; prepend one when the client's
/// history is empty or opens with the assistant.
pub fn conversation_for(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut conversation = Vec::with_capacity(history.len() + 1);
    if history.first().map_or(true, |m| m.role != ChatRole::User) {
        conversation.push(ChatMessage::user(CHAT_KICKOFF));
    }
    conversation.extend(history.iter().cloned());
    conversation
}

/// One assistant turn for the client-held conversation.
pub async fn chat_turn(
    llm: &LlmClient,
    persona: ChatPersona,
    company: &str,
    role: &str,
    history: &[ChatMessage],
) -> Result<ChatMessage, AppError> {
    let system = build_persona_system(persona, company, role);
    let conversation = conversation_for(history);
    let options = CompletionOptions {
        max_tokens: CHAT_MAX_TOKENS,
        temperature: Some(CHAT_TEMPERATURE),
    };
    let reply = llm.chat(&system, &conversation, options).await?;
    Ok(ChatMessage::assistant(reply))
}
