use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{ApplicationStore, DetailsUpdate, StoreError, UpsertOutcome};
use crate::classifier::ClassifiedApplication;
use crate::models::application::{
    ApplicationRecord, ApplicationRow, ApplicationStatus, FieldSource,
};

/// Postgres-backed store over the `applications` table.
#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves why an owner-scoped statement matched no row.
    async fn ownership_failure(&self, id: Uuid) -> StoreError {
        let owner: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT user_email FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        match owner {
            Ok(Some(_)) => StoreError::Forbidden(id),
            Ok(None) => StoreError::NotFound(id),
            Err(e) => StoreError::Database(e),
        }
    }

    async fn finish(
        &self,
        id: Uuid,
        row: Option<ApplicationRow>,
    ) -> Result<ApplicationRecord, StoreError> {
        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.ownership_failure(id).await),
        }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<ApplicationRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE user_email = $1 ORDER BY email_date DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApplicationRecord::from).collect())
    }

    async fn get(&self, id: Uuid, owner: &str) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE id = $1 AND user_email = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        self.finish(id, row).await
    }

    async fn upsert_synced(
        &self,
        owner: &str,
        classified: &ClassifiedApplication,
    ) -> Result<UpsertOutcome, StoreError> {
        // xmax = 0 only for freshly inserted tuples.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO applications
                (id, user_email, thread_id, company, role, status, status_source,
                 details_source, subject, snippet, email_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10)
            ON CONFLICT (user_email, thread_id) DO UPDATE SET
                company    = CASE WHEN applications.details_source = 'manual'
                                  THEN applications.company
                                  ELSE EXCLUDED.company END,
                role       = CASE WHEN applications.details_source = 'manual'
                                  THEN applications.role
                                  ELSE EXCLUDED.role END,
                status     = CASE WHEN applications.status_source = 'manual'
                                  THEN applications.status
                                  ELSE EXCLUDED.status END,
                subject    = EXCLUDED.subject,
                snippet    = EXCLUDED.snippet,
                email_date = EXCLUDED.email_date,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&classified.thread_id)
        .bind(&classified.company)
        .bind(&classified.role)
        .bind(classified.status.as_str())
        .bind(FieldSource::Auto.as_str())
        .bind(&classified.subject)
        .bind(&classified.snippet)
        .bind(classified.email_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn update_status(
        &self,
        id: Uuid,
        owner: &str,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET status = $3, status_source = $4, updated_at = NOW()
            WHERE id = $1 AND user_email = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(status.as_str())
        .bind(FieldSource::Manual.as_str())
        .fetch_optional(&self.pool)
        .await?;
        self.finish(id, row).await
    }

    async fn update_details(
        &self,
        id: Uuid,
        owner: &str,
        details: &DetailsUpdate,
    ) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET company = COALESCE($3, company),
                role = COALESCE($4, role),
                details_source = $5,
                updated_at = NOW()
            WHERE id = $1 AND user_email = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(details.company.as_deref())
        .bind(details.role.as_deref())
        .bind(FieldSource::Manual.as_str())
        .fetch_optional(&self.pool)
        .await?;
        self.finish(id, row).await
    }

    async fn save_notes(
        &self,
        id: Uuid,
        owner: &str,
        notes: &str,
    ) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications SET notes = $3, updated_at = NOW()
            WHERE id = $1 AND user_email = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        self.finish(id, row).await
    }

    async fn attach_resume(
        &self,
        id: Uuid,
        owner: &str,
        file_name: &str,
        key: &str,
    ) -> Result<ApplicationRecord, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET resume_file_name = $3, resume_key = $4, updated_at = NOW()
            WHERE id = $1 AND user_email = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(file_name)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        self.finish(id, row).await
    }

    async fn delete(&self, id: Uuid, owner: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_email = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(self.ownership_failure(id).await);
        }
        info!("Deleted application {id}");
        Ok(())
    }
}
