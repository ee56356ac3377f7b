//! Behaviour every `ApplicationStore` must share. Run against the memory store
//! on every test run and against Postgres when `TEST_DATABASE_URL` is set.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::{ApplicationStore, DetailsUpdate, StoreError, UpsertOutcome};
use crate::classifier::ClassifiedApplication;
use crate::models::application::{ApplicationStatus, FieldSource};

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

/// Owners are randomised so a shared database can be reused between runs.
pub async fn assert_store_semantics(store: &dyn ApplicationStore) {
    let run = Uuid::new_v4().simple().to_string();
    let owner = format!("owner-{run}@x.com");
    let intruder = format!("intruder-{run}@x.com");

    // Insert vs update detection, keyed on (owner, thread).
    let first = classified("t-1", ApplicationStatus::Applied);
    assert_eq!(store.upsert_synced(&owner, &first).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_synced(&owner, &first).await.unwrap(), UpsertOutcome::Updated);
    assert_eq!(
        store.upsert_synced(&intruder, &first).await.unwrap(),
        UpsertOutcome::Inserted
    );
    let owned = store.list_for_owner(&owner).await.unwrap();
    assert_eq!(owned.len(), 1);
    let id = owned[0].id;

    // Auto status follows sync.
    store
        .upsert_synced(&owner, &classified("t-1", ApplicationStatus::Interview))
        .await
        .unwrap();
    assert_eq!(store.get(id, &owner).await.unwrap().status, ApplicationStatus::Interview);

    // User edits survive a re-sync.
    store.save_notes(id, &owner, "call back Monday").await.unwrap();
    store
        .update_status(id, &owner, ApplicationStatus::Offer)
        .await
        .unwrap();
    let corrected = store
        .update_details(
            id,
            &owner,
            &DetailsUpdate {
                company: Some("Acme Robotics".to_string()),
                role: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.details_source, FieldSource::Manual);

    let mut rejected = classified("t-1", ApplicationStatus::Rejected);
    rejected.snippet = "Unfortunately".to_string();
    assert_eq!(
        store.upsert_synced(&owner, &rejected).await.unwrap(),
        UpsertOutcome::Updated
    );
    let record = store.get(id, &owner).await.unwrap();
    assert_eq!(record.status, ApplicationStatus::Offer);
    assert_eq!(record.status_source, FieldSource::Manual);
    assert_eq!(record.company, "Acme Robotics");
    assert_eq!(record.role, "Engineer");
    assert_eq!(record.notes, "call back Monday");
    assert_eq!(record.snippet, "Unfortunately");

    // Another owner gets 403 and changes nothing.
    assert!(matches!(
        store.get(id, &intruder).await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        store
            .update_status(id, &intruder, ApplicationStatus::Rejected)
            .await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        store.save_notes(id, &intruder, "mine now").await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        store.attach_resume(id, &intruder, "cv.pdf", "k").await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        store.delete(id, &intruder).await,
        Err(StoreError::Forbidden(_))
    ));
    let untouched = store.get(id, &owner).await.unwrap();
    assert_eq!(untouched.status, ApplicationStatus::Offer);
    assert_eq!(untouched.notes, "call back Monday");
    assert!(untouched.resume_key.is_none());

    // Unknown ids are 404.
    let missing = Uuid::new_v4();
    assert!(matches!(
        store.get(missing, &owner).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.save_notes(missing, &owner, "x").await,
        Err(StoreError::NotFound(_))
    ));

    // Owner delete, after which the id is gone.
    store.delete(id, &owner).await.unwrap();
    assert!(matches!(
        store.delete(id, &owner).await,
        Err(StoreError::NotFound(_))
    ));
    let leftover = store.list_for_owner(&intruder).await.unwrap();
    for record in leftover {
        store.delete(record.id, &intruder).await.unwrap();
    }
}
