use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which optional collaborators are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "configured": {
            "database": state.db.is_some(),
            "llm": state.llm.is_some(),
            "storage": state.s3.is_some() && state.config.s3_bucket.is_some(),
            "oauth": state.oauth().is_ok(),
        }
    }))
}
