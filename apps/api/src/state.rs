use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::google::OAuthSettings;
use crate::auth::LoginStates;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::store::ApplicationStore;
use crate::sync::lock::SyncLock;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Collaborators are optional; the accessors turn a missing one into a
/// descriptive `AppError::Config` at request time.
#[derive(Clone)]
pub struct AppState {
    pub db: Option<PgPool>,
    pub store: Option<Arc<dyn ApplicationStore>>,
    pub s3: Option<S3Client>,
    pub llm: Option<LlmClient>,
    /// Shared client for OAuth calls; carries the upstream timeout.
    pub http: reqwest::Client,
    pub config: Config,
    /// Pluggable email classifier. Default: KeywordClassifier.
    pub classifier: Arc<dyn Classifier>,
    pub sync_lock: SyncLock,
    pub login_states: LoginStates,
}

impl AppState {
    pub fn db(&self) -> Result<&PgPool, AppError> {
        self.db
            .as_ref()
            .ok_or_else(|| AppError::missing_config("DATABASE_URL"))
    }

    pub fn store(&self) -> Result<&dyn ApplicationStore, AppError> {
        self.store
            .as_deref()
            .ok_or_else(|| AppError::missing_config("DATABASE_URL"))
    }

    pub fn llm(&self) -> Result<&LlmClient, AppError> {
        self.llm
            .as_ref()
            .ok_or_else(|| AppError::missing_config("ANTHROPIC_API_KEY"))
    }

    pub fn s3(&self) -> Result<(&S3Client, &str), AppError> {
        let bucket = self
            .config
            .s3_bucket
            .as_deref()
            .ok_or_else(|| AppError::missing_config("S3_BUCKET"))?;
        let client = self
            .s3
            .as_ref()
            .ok_or_else(|| AppError::missing_config("S3_ENDPOINT"))?;
        Ok((client, bucket))
    }

    pub fn oauth(&self) -> Result<OAuthSettings, AppError> {
        let require = |value: &Option<String>, var: &str| {
            value.clone().ok_or_else(|| AppError::missing_config(var))
        };
        Ok(OAuthSettings {
            client_id: require(&self.config.google_client_id, "GOOGLE_CLIENT_ID")?,
            client_secret: require(&self.config.google_client_secret, "GOOGLE_CLIENT_SECRET")?,
            redirect_uri: require(&self.config.google_redirect_uri, "GOOGLE_REDIRECT_URI")?,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// State with no external collaborators configured.
    pub fn bare() -> Self {
        AppState {
            db: None,
            store: None,
            s3: None,
            llm: None,
            http: reqwest::Client::new(),
            config: Config::bare(),
            classifier: Arc::new(crate::classifier::KeywordClassifier),
            sync_lock: SyncLock::local(),
            login_states: LoginStates::default(),
        }
    }
}
