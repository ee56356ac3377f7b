mod assist;
mod attachments;
mod auth;
mod classifier;
mod config;
mod dashboard;
mod db;
mod documents;
mod errors;
mod llm_client;
mod mail;
mod models;
mod routes;
mod state;
mod store;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::LoginStates;
use crate::classifier::KeywordClassifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgApplicationStore;
use crate::store::ApplicationStore;
use crate::sync::lock::SyncLock;
use crate::sync::scheduler::spawn_auto_sync;

#[tokio::main]
async fn main() -> Result<()> {
    // Malformed values fail here; missing collaborators only disable features.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Applytrack API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            warn!("DATABASE_URL is not set; auth, sync and application routes will fail");
            None
        }
    };
    let store = db
        .clone()
        .map(|pool| Arc::new(PgApplicationStore::new(pool)) as Arc<dyn ApplicationStore>);

    // Initialize Redis (sync lock)
    let sync_lock = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            info!("Redis client initialized for sync locking");
            SyncLock::Redis(client)
        }
        None => {
            info!("REDIS_URL is not set; using in-process sync lock");
            SyncLock::local()
        }
    };

    // Initialize S3 / MinIO
    let s3 = match &config.s3_endpoint {
        Some(endpoint) => {
            let client = build_s3_client(&config, endpoint).await;
            info!("S3 client initialized");
            Some(client)
        }
        None => None,
    };

    // Initialize LLM client
    let llm = match &config.anthropic_api_key {
        Some(key) => {
            let client =
                LlmClient::new(key.clone(), config.upstream_timeout(), config.llm_max_attempts)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => {
            warn!("ANTHROPIC_API_KEY is not set; /analyze and /interview will fail");
            None
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    // Build app state
    let state = AppState {
        db,
        store,
        s3,
        llm,
        http,
        config: config.clone(),
        classifier: Arc::new(KeywordClassifier),
        sync_lock,
        login_states: LoginStates::default(),
    };

    spawn_auto_sync(state.clone());

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (local) or AWS. Falls back to the default
/// credential chain when static keys are not configured.
async fn build_s3_client(config: &Config, endpoint: &str) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint);

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "applytrack-static",
        ));
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
