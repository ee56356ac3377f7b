//! Sync Job: pulls recent job-related mail, classifies it, and upserts the
//! survivors into the Application Store keyed by (owner, thread id).
//!
//! Flow: list message ids → for each id (sequentially): fetch → classify → upsert.
//! A message that fails to fetch or parse is logged and skipped; a credential
//! rejection from the provider aborts the whole run.

pub mod handlers;
pub mod lock;
pub mod scheduler;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{sessions, AuthError};
use crate::classifier::Classifier;
use crate::errors::AppError;
use crate::mail::gmail::GmailClient;
use crate::mail::{MailError, MailProvider, JOB_SEARCH_QUERY};
use crate::state::AppState;
use crate::store::{ApplicationStore, UpsertOutcome};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub query: String,
    pub max_results: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            query: JOB_SEARCH_QUERY.to_string(),
            max_results: 20,
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records added or updated.
    pub count: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Messages that could not be fetched or parsed.
    pub skipped: usize,
    /// Messages the classifier judged not job-related.
    pub ignored: usize,
}

fn mail_failure(err: MailError) -> AppError {
    match err {
        MailError::Unauthorized => {
            AuthError::ProviderRejected("mail access token was refused".to_string()).into()
        }
        other => AppError::Upstream(other.to_string()),
    }
}

pub async fn run_sync(
    mail: &dyn MailProvider,
    classifier: &dyn Classifier,
    store: &dyn ApplicationStore,
    owner: &str,
    options: &SyncOptions,
) -> Result<SyncReport, AppError> {
    let ids = mail
        .list_message_ids(&options.query, options.max_results)
        .await
        .map_err(mail_failure)?;

    let mut report = SyncReport::default();

    for id in ids.iter().take(options.max_results as usize) {
        let email = match mail.get_message(id).await {
            Ok(email) => email,
            Err(MailError::Unauthorized) => return Err(mail_failure(MailError::Unauthorized)),
            Err(e) => {
                warn!("Skipped message {id}: {e}");
                report.skipped += 1;
                continue;
            }
        };

        let Some(classified) = classifier.classify(&email) else {
            report.ignored += 1;
            continue;
        };

        match store.upsert_synced(owner, &classified).await? {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::Updated => report.updated += 1,
        }
    }

    report.count = report.inserted + report.updated;
    info!(
        "Sync for {owner}: {} added, {} updated, {} skipped, {} not job-related",
        report.inserted, report.updated, report.skipped, report.ignored
    );
    Ok(report)
}

/// Resolves credentials for `owner` and runs one exclusive sync against Gmail.
pub async fn sync_account(state: &AppState, owner: &str) -> Result<SyncReport, AppError> {
    let store = state.store()?;
    let pool = state.db()?;
    let oauth = state.oauth()?;

    let access_token = sessions::fresh_access_token(pool, &state.http, &oauth, owner).await?;
    let gmail = GmailClient::new(access_token, state.config.upstream_timeout())
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    let options = SyncOptions {
        max_results: state.config.sync_max_results,
        ..SyncOptions::default()
    };

    state
        .sync_lock
        .run_exclusive(
            owner,
            run_sync(&gmail, state.classifier.as_ref(), store, owner, &options),
        )
        .await
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::models::application::ApplicationStatus;
    use crate::store::memory::MemoryApplicationStore;

    const OWNER: &str = "alice@example.com";

    fn mailbox() -> ScriptedMailbox {
        ScriptedMailbox::new(vec![
            (
                "1",
                job_email(
                    "thread-a",
                    "Interview Invitation – Acme",
                    "Acme Recruiting Team <hr@acme.com>",
                    "please share your availability for a phone screen",
                ),
            ),
            (
                "2",
                job_email(
                    "thread-b",
                    "Your application for Data Engineer at Globex",
                    "Globex Careers <jobs@globex.com>",
                    "We received your application.",
                ),
            ),
            (
                "3",
                job_email(
                    "thread-c",
                    "Weekend plans",
                    "Bob <bob@example.com>",
                    "Barbecue on Saturday?",
                ),
            ),
            ("4", Scripted::Fails),
        ])
    }

    #[tokio::test]
    async fn test_sync_ingests_classified_mail_and_skips_failures() {
        let mail = mailbox();
        let store = MemoryApplicationStore::new();

        let report = run_sync(&mail, &KeywordClassifier, &store, OWNER, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(
            report,
            SyncReport {
                count: 2,
                inserted: 2,
                updated: 0,
                skipped: 1,
                ignored: 1,
            }
        );

        let records = store.list_for_owner(OWNER).await.unwrap();
        let acme = records.iter().find(|r| r.thread_id == "thread-a").unwrap();
        assert_eq!(acme.status, ApplicationStatus::Interview);
        assert_eq!(acme.company, "Acme");
        assert_eq!(acme.role, "Unknown Role");

        let globex = records.iter().find(|r| r.thread_id == "thread-b").unwrap();
        assert_eq!(globex.role, "Data Engineer");
        assert_eq!(globex.status, ApplicationStatus::Applied);
    }

    #[tokio::test]
    async fn test_resync_is_idempotent() {
        let mail = mailbox();
        let store = MemoryApplicationStore::new();
        let options = SyncOptions::default();

        run_sync(&mail, &KeywordClassifier, &store, OWNER, &options)
            .await
            .unwrap();
        let second = run_sync(&mail, &KeywordClassifier, &store, OWNER, &options)
            .await
            .unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);
        assert_eq!(store.list_for_owner(OWNER).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resync_keeps_user_edits() {
        let mail = mailbox();
        let store = MemoryApplicationStore::new();
        let options = SyncOptions::default();
        run_sync(&mail, &KeywordClassifier, &store, OWNER, &options)
            .await
            .unwrap();

        let id = store
            .list_for_owner(OWNER)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.thread_id == "thread-a")
            .unwrap()
            .id;
        store.save_notes(id, OWNER, "prep system design").await.unwrap();
        store
            .update_status(id, OWNER, ApplicationStatus::Offer)
            .await
            .unwrap();

        run_sync(&mail, &KeywordClassifier, &store, OWNER, &options)
            .await
            .unwrap();

        let record = store.get(id, OWNER).await.unwrap();
        assert_eq!(record.notes, "prep system design");
        assert_eq!(record.status, ApplicationStatus::Offer);
    }

    #[tokio::test]
    async fn test_batch_cap_limits_fetches() {
        let mail = mailbox();
        let store = MemoryApplicationStore::new();
        let options = SyncOptions {
            max_results: 2,
            ..SyncOptions::default()
        };

        run_sync(&mail, &KeywordClassifier, &store, OWNER, &options)
            .await
            .unwrap();
        assert_eq!(mail.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_rejection_aborts_with_provider_error() {
        let mut mail = mailbox();
        mail.list_unauthorized = true;
        let store = MemoryApplicationStore::new();

        let err = run_sync(&mail, &KeywordClassifier, &store, OWNER, &SyncOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::ProviderRejected(_))));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_mid_batch_rejection_aborts() {
        let mail = ScriptedMailbox::new(vec![
            (
                "1",
                job_email(
                    "thread-a",
                    "Application received",
                    "Acme <jobs@acme.com>",
                    "Thanks",
                ),
            ),
            ("2", Scripted::Unauthorized),
            (
                "3",
                job_email(
                    "thread-c",
                    "Application received",
                    "Initech <jobs@initech.com>",
                    "Thanks",
                ),
            ),
        ]);
        let store = MemoryApplicationStore::new();

        let err = run_sync(&mail, &KeywordClassifier, &store, OWNER, &SyncOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::ProviderRejected(_))));
        assert_eq!(mail.fetched.lock().unwrap().as_slice(), ["1", "2"]);
    }
}
