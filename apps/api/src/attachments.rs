//! Resume attachments: a file uploaded against one application, stored in S3
//! and recorded on the owner's record.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::documents::{read_file_field, sanitize_file_name};
use crate::errors::AppError;
use crate::models::application::ApplicationRecord;
use crate::state::AppState;

/// `resumes/<owner>/<application id>/<uuid>-<file name>`
pub fn resume_object_key(owner: &str, application_id: Uuid, file_name: &str) -> String {
    format!(
        "resumes/{owner}/{application_id}/{}-{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

/// POST /applications/:id/resume
///
/// Multipart `file` part. Ownership is checked before anything is uploaded.
pub async fn handle_attach_resume(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApplicationRecord>, AppError> {
    let store = state.store()?;
    let (s3, bucket) = state.s3()?;
    store.get(id, &session.user_email).await?;

    let upload = read_file_field(multipart).await?;
    let file_name = sanitize_file_name(&upload.file_name);
    let key = resume_object_key(&session.user_email, id, &file_name);
    let size = upload.bytes.len();

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .content_type(
            upload
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        )
        .body(ByteStream::from(upload.bytes))
        .send()
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;

    info!("Stored {size}-byte resume for application {id} at {key}");

    let record = store
        .attach_resume(id, &session.user_email, &file_name, &key)
        .await?;
    Ok(Json(record))
}
