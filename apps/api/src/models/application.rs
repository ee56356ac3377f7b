use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a tracked application. Any state may move to any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    /// Board column order.
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Interview => "INTERVIEW",
            ApplicationStatus::Offer => "OFFER",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPLIED" => Ok(ApplicationStatus::Applied),
            "INTERVIEW" => Ok(ApplicationStatus::Interview),
            "OFFER" => Ok(ApplicationStatus::Offer),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

/// Who last wrote a sync-derived field (`status`, or `company`/`role`).
/// Sync only overwrites fields it still owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    #[default]
    Auto,
    Manual,
}

impl FieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSource::Auto => "auto",
            FieldSource::Manual => "manual",
        }
    }

    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("manual") {
            FieldSource::Manual
        } else {
            FieldSource::Auto
        }
    }
}

/// Raw `applications` row as stored in Postgres.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_email: String,
    pub thread_id: String,
    pub company: String,
    pub role: String,
    pub status: String,
    pub status_source: String,
    pub details_source: String,
    pub subject: String,
    pub snippet: String,
    pub email_date: DateTime<Utc>,
    pub notes: String,
    pub resume_file_name: Option<String>,
    pub resume_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One tracked application, one per (owner, mail thread).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub user_email: String,
    pub thread_id: String,
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
    pub status_source: FieldSource,
    pub details_source: FieldSource,
    pub subject: String,
    pub snippet: String,
    pub email_date: DateTime<Utc>,
    pub notes: String,
    pub resume_file_name: Option<String>,
    #[serde(skip_serializing)]
    pub resume_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationRow> for ApplicationRecord {
    fn from(row: ApplicationRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|e| {
            tracing::warn!("Application {} has {e}; treating as APPLIED", row.id);
            ApplicationStatus::Applied
        });
        Self {
            id: row.id,
            user_email: row.user_email,
            thread_id: row.thread_id,
            company: row.company,
            role: row.role,
            status,
            status_source: FieldSource::parse(&row.status_source),
            details_source: FieldSource::parse(&row.details_source),
            subject: row.subject,
            snippet: row.snippet,
            email_date: row.email_date,
            notes: row.notes,
            resume_file_name: row.resume_file_name,
            resume_key: row.resume_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
