//! In-memory `ApplicationStore` used by tests. Mirrors the Postgres semantics.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ApplicationStore, DetailsUpdate, StoreError, UpsertOutcome};
use crate::classifier::ClassifiedApplication;
use crate::models::application::{ApplicationRecord, ApplicationStatus, FieldSource};

#[derive(Default)]
pub struct MemoryApplicationStore {
    records: Mutex<Vec<ApplicationRecord>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn insert(&self, record: ApplicationRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Raw lookup that ignores ownership, for asserting on other users' rows.
    pub fn find(&self, id: Uuid) -> Option<ApplicationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn mutate<F>(&self, id: Uuid, owner: &str, f: F) -> Result<ApplicationRecord, StoreError>
    where
        F: FnOnce(&mut ApplicationRecord),
    {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if record.user_email != owner {
            return Err(StoreError::Forbidden(id));
        }
        f(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<ApplicationRecord>, StoreError> {
        let mut owned: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_email == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.email_date.cmp(&a.email_date));
        Ok(owned)
    }

    async fn get(&self, id: Uuid, owner: &str) -> Result<ApplicationRecord, StoreError> {
        let record = self.find(id).ok_or(StoreError::NotFound(id))?;
        if record.user_email != owner {
            return Err(StoreError::Forbidden(id));
        }
        Ok(record)
    }

    async fn upsert_synced(
        &self,
        owner: &str,
        classified: &ClassifiedApplication,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut records = self.records.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.user_email == owner && r.thread_id == classified.thread_id)
        {
            if existing.details_source == FieldSource::Auto {
                existing.company = classified.company.clone();
                existing.role = classified.role.clone();
            }
            if existing.status_source == FieldSource::Auto {
                existing.status = classified.status;
            }
            existing.subject = classified.subject.clone();
            existing.snippet = classified.snippet.clone();
            existing.email_date = classified.email_date;
            existing.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        records.push(ApplicationRecord {
            id: Uuid::new_v4(),
            user_email: owner.to_string(),
            thread_id: classified.thread_id.clone(),
            company: classified.company.clone(),
            role: classified.role.clone(),
            status: classified.status,
            status_source: FieldSource::Auto,
            details_source: FieldSource::Auto,
            subject: classified.subject.clone(),
            snippet: classified.snippet.clone(),
            email_date: classified.email_date,
            notes: String::new(),
            resume_file_name: None,
            resume_key: None,
            created_at: now,
            updated_at: now,
        });
        Ok(UpsertOutcome::Inserted)
    }

    async fn update_status(
        &self,
        id: Uuid,
        owner: &str,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        self.mutate(id, owner, |r| {
            r.status = status;
            r.status_source = FieldSource::Manual;
        })
    }

    async fn update_details(
        &self,
        id: Uuid,
        owner: &str,
        details: &DetailsUpdate,
    ) -> Result<ApplicationRecord, StoreError> {
        self.mutate(id, owner, |r| {
            if let Some(company) = &details.company {
                r.company = company.clone();
            }
            if let Some(role) = &details.role {
                r.role = role.clone();
            }
            r.details_source = FieldSource::Manual;
        })
    }

    async fn save_notes(
        &self,
        id: Uuid,
        owner: &str,
        notes: &str,
    ) -> Result<ApplicationRecord, StoreError> {
        self.mutate(id, owner, |r| r.notes = notes.to_string())
    }

    async fn attach_resume(
        &self,
        id: Uuid,
        owner: &str,
        file_name: &str,
        key: &str,
    ) -> Result<ApplicationRecord, StoreError> {
        self.mutate(id, owner, |r| {
            r.resume_file_name = Some(file_name.to_string());
            r.resume_key = Some(key.to_string());
        })
    }

    async fn delete(&self, id: Uuid, owner: &str) -> Result<(), StoreError> {
        self.mutate(id, owner, |_| {})?;
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn classified(thread_id: &str, status: ApplicationStatus) -> ClassifiedApplication {
        ClassifiedApplication {
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            status,
            subject: "Your application".to_string(),
            snippet: "Thanks for applying".to_string(),
            thread_id: thread_id.to_string(),
            email_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_on_owner_and_thread() {
        let store = MemoryApplicationStore::new();
        let c = classified("t-1", ApplicationStatus::Applied);

        assert_eq!(
            store.upsert_synced("a@x.com", &c).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_synced("a@x.com", &c).await.unwrap(),
            UpsertOutcome::Updated
        );
        // Same thread id under another owner is a separate record.
        assert_eq!(
            store.upsert_synced("b@x.com", &c).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_resync_preserves_notes_and_manual_status() {
        let store = MemoryApplicationStore::new();
        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Applied))
            .await
            .unwrap();
        let id = store.list_for_owner("a@x.com").await.unwrap()[0].id;

        store.save_notes(id, "a@x.com", "call back Monday").await.unwrap();
        store
            .update_status(id, "a@x.com", ApplicationStatus::Offer)
            .await
            .unwrap();

        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Rejected))
            .await
            .unwrap();

        let record = store.get(id, "a@x.com").await.unwrap();
        assert_eq!(record.notes, "call back Monday");
        assert_eq!(record.status, ApplicationStatus::Offer);
        assert_eq!(record.status_source, FieldSource::Manual);
    }

    #[tokio::test]
    async fn test_resync_overwrites_auto_status() {
        let store = MemoryApplicationStore::new();
        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Applied))
            .await
            .unwrap();
        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Interview))
            .await
            .unwrap();
        let record = &store.list_for_owner("a@x.com").await.unwrap()[0];
        assert_eq!(record.status, ApplicationStatus::Interview);
    }

    #[tokio::test]
    async fn test_cross_owner_mutations_are_forbidden_and_inert() {
        let store = MemoryApplicationStore::new();
        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Applied))
            .await
            .unwrap();
        let id = store.list_for_owner("a@x.com").await.unwrap()[0].id;

        let attempts = [
            store
                .update_status(id, "b@x.com", ApplicationStatus::Rejected)
                .await
                .err(),
            store.save_notes(id, "b@x.com", "mine now").await.err(),
            store
                .update_details(
                    id,
                    "b@x.com",
                    &DetailsUpdate {
                        company: Some("Evil".into()),
                        role: None,
                    },
                )
                .await
                .err(),
            store.attach_resume(id, "b@x.com", "cv.pdf", "k").await.err(),
            store.delete(id, "b@x.com").await.err(),
        ];
        for err in attempts {
            assert!(matches!(err, Some(StoreError::Forbidden(_))));
        }

        let untouched = store.find(id).unwrap();
        assert_eq!(untouched.status, ApplicationStatus::Applied);
        assert_eq!(untouched.notes, "");
        assert_eq!(untouched.company, "Acme");
        assert!(untouched.resume_key.is_none());
    }

    #[tokio::test]
    async fn test_shared_store_semantics() {
        crate::store::conformance::assert_store_semantics(&MemoryApplicationStore::new()).await;
    }

    #[tokio::test]
    async fn test_resync_preserves_manual_details() {
        let store = MemoryApplicationStore::new();
        store
            .upsert_synced("a@x.com", &classified("t-1", ApplicationStatus::Applied))
            .await
            .unwrap();
        let id = store.list_for_owner("a@x.com").await.unwrap()[0].id;
        store
            .update_details(
                id,
                "a@x.com",
                &DetailsUpdate {
                    company: None,
                    role: Some("Staff Engineer".into()),
                },
            )
            .await
            .unwrap();

        let mut resynced = classified("t-1", ApplicationStatus::Interview);
        resynced.company = "Acme Recruiting".to_string();
        store.upsert_synced("a@x.com", &resynced).await.unwrap();

        let record = store.get(id, "a@x.com").await.unwrap();
        assert_eq!(record.role, "Staff Engineer");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.details_source, FieldSource::Manual);
        // Status is still auto-owned.
        assert_eq!(record.status, ApplicationStatus::Interview);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = MemoryApplicationStore::new();
        let err = store.delete(Uuid::new_v4(), "a@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
