//! Application Store: persisted application records, one per (owner, thread).
//!
//! Every query is scoped by the owner's email. Mutations against a record that
//! exists under a different owner fail with `StoreError::Forbidden` and leave the
//! record untouched.

#[cfg(test)]
mod conformance;
#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::ClassifiedApplication;
use crate::models::application::{ApplicationRecord, ApplicationStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("application {0} not found")]
    NotFound(Uuid),

    #[error("application {0} is owned by another user")]
    Forbidden(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Whether a synced email created a new record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// User edits to the heuristically derived fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsUpdate {
    pub company: Option<String>,
    pub role: Option<String>,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// All of an owner's applications, newest email first.
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<ApplicationRecord>, StoreError>;

    async fn get(&self, id: Uuid, owner: &str) -> Result<ApplicationRecord, StoreError>;

    /// Insert-or-update keyed on (owner, thread id).
    ///
    /// Refreshes company, role, subject, snippet and date. Notes and attachments
    /// are kept. Status is only overwritten while it has not been set manually.
    async fn upsert_synced(
        &self,
        owner: &str,
        classified: &ClassifiedApplication,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Explicit user status change; marks the status as manually set.
    async fn update_status(
        &self,
        id: Uuid,
        owner: &str,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn update_details(
        &self,
        id: Uuid,
        owner: &str,
        details: &DetailsUpdate,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn save_notes(
        &self,
        id: Uuid,
        owner: &str,
        notes: &str,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn attach_resume(
        &self,
        id: Uuid,
        owner: &str,
        file_name: &str,
        key: &str,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn delete(&self, id: Uuid, owner: &str) -> Result<(), StoreError>;
}
