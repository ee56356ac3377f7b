//! Mail provider seam for the sync job.
//!
//! `GmailClient` is the production implementation; tests script their own.

pub mod gmail;

use async_trait::async_trait;
use thiserror::Error;

use crate::classifier::EmailSummary;

/// Fixed search for job-related mail since the start of 2024.
pub const JOB_SEARCH_QUERY: &str = "subject:(application OR interview OR offer OR \"status of your job\") \
     -subject:\"security alert\" -subject:\"verification\" after:2024-01-01";

#[derive(Debug, Error)]
pub enum MailError {
    /// The provider refused the access token (expired, revoked, wrong scope).
    #[error("mail provider rejected the credentials")]
    Unauthorized,

    #[error("mail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed mail response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Ids of the most recent messages matching `query`, at most `max_results`.
    async fn list_message_ids(&self, query: &str, max_results: u32)
        -> Result<Vec<String>, MailError>;

    async fn get_message(&self, id: &str) -> Result<EmailSummary, MailError>;
}
