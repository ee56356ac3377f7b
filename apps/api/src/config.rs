use anyhow::{bail, Context, Result};

/// Upper bound for hour-valued settings (ten years).
const MAX_SETTING_HOURS: i64 = 24 * 365 * 10;

/// Application configuration loaded from environment variables.
///
/// Only malformed values fail startup. Settings for external collaborators
/// (database, mail OAuth, LLM, object storage) are optional here and checked
/// by the handler that needs them, which answers with a descriptive 500.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// Applied to every mail, OAuth and LLM request.
    pub upstream_timeout_secs: u64,
    /// 1 means a single attempt with no retry.
    pub llm_max_attempts: u32,
    pub sync_max_results: u32,
    /// `None` (AUTO_SYNC_INTERVAL_HOURS=0) disables the background auto-sync.
    pub auto_sync_interval: Option<chrono::Duration>,
    pub session_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            google_client_id: optional_env("GOOGLE_CLIENT_ID"),
            google_client_secret: optional_env("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri: optional_env("GOOGLE_REDIRECT_URI"),
            s3_bucket: optional_env("S3_BUCKET"),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            upstream_timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS", 30)?,
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)?,
            sync_max_results: parse_env("SYNC_MAX_RESULTS", 20)?,
            auto_sync_interval: match parse_env("AUTO_SYNC_INTERVAL_HOURS", 12)? {
                0 => None,
                hours => Some(hours_setting("AUTO_SYNC_INTERVAL_HOURS", hours)?),
            },
            session_ttl: hours_setting(
                "SESSION_TTL_HOURS",
                parse_env("SESSION_TTL_HOURS", 720)?,
            )?,
        })
    }

    pub fn upstream_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Unset and blank values are both treated as missing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// Whole hours as a duration; rejects values that would overflow date arithmetic.
fn hours_setting(key: &str, hours: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_SETTING_HOURS).contains(&hours) {
        bail!("Environment variable '{key}' must be between 1 and {MAX_SETTING_HOURS} hours, got {hours}");
    }
    chrono::Duration::try_hours(hours)
        .with_context(|| format!("Environment variable '{key}' is out of range"))
}

#[cfg(test)]
impl Config {
    /// Config with every collaborator unset, as on a bare machine.
    pub fn bare() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            database_url: None,
            redis_url: None,
            anthropic_api_key: None,
            google_client_id: None,
            google_client_secret: None,
            google_redirect_uri: None,
            s3_bucket: None,
            s3_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            upstream_timeout_secs: 30,
            llm_max_attempts: 1,
            sync_max_results: 20,
            auto_sync_interval: None,
            session_ttl: chrono::Duration::hours(720),
        }
    }
}
