//! Email classification: turns a raw mail summary into a tracked application.
//!
//! Default: `KeywordClassifier` (ordered keyword rules, pure and deterministic).
//! `AppState` holds an `Arc<dyn Classifier>` so a model-backed classifier can be
//! swapped in without touching the sync orchestration.

pub mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::application::ApplicationStatus;

/// Header/snippet view of one mail message, as handed over by a mail provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub message_id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub snippet: String,
    /// Raw `Date` header, if the message carried one.
    pub date_header: Option<String>,
    /// Provider receive time in epoch milliseconds.
    pub internal_date_ms: Option<i64>,
}

/// Structured result of classifying a job-related email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedApplication {
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
    pub subject: String,
    pub snippet: String,
    pub thread_id: String,
    pub email_date: DateTime<Utc>,
}

/// Maps an email to an application, or `None` when it is not job-related.
pub trait Classifier: Send + Sync {
    fn classify(&self, email: &EmailSummary) -> Option<ClassifiedApplication>;
}

/// Keyword-rule classifier. See `rules` for the individual heuristics.
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, email: &EmailSummary) -> Option<ClassifiedApplication> {
        let subject = rules::clean_text(&email.subject);
        let from = rules::clean_text(&email.from);
        let snippet = rules::clean_text(&email.snippet);

        if !rules::is_job_related(&subject, &snippet, &from) {
            return None;
        }

        Some(ClassifiedApplication {
            company: rules::extract_company(&from),
            role: rules::extract_role(&subject),
            status: rules::classify_status(&subject, &snippet),
            email_date: rules::resolve_email_date(
                email.date_header.as_deref(),
                email.internal_date_ms,
                Utc::now(),
            ),
            thread_id: email.thread_id.clone(),
            subject,
            snippet,
        })
    }
}
