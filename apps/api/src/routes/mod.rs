pub mod applications;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::assist::handlers as assist;
use crate::attachments;
use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::state::AppState;
use crate::sync::handlers as sync;

/// Request body cap for routes that accept file uploads.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/login", get(auth::handle_login))
        .route("/auth/callback", get(auth::handle_callback))
        .route("/auth/logout", post(auth::handle_logout))
        // Sync
        .route("/sync", post(sync::handle_sync))
        // Applications
        .route("/applications", get(applications::handle_list))
        .route(
            "/applications/:id",
            patch(applications::handle_update_details).delete(applications::handle_delete),
        )
        .route(
            "/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/applications/:id/notes",
            patch(applications::handle_save_notes),
        )
        .route(
            "/applications/:id/resume",
            post(attachments::handle_attach_resume)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        // Dashboard
        .route("/dashboard", get(dashboard::handle_dashboard))
        .route("/board/move", post(dashboard::handle_board_move))
        // AI assist
        .route(
            "/analyze",
            post(assist::handle_analyze).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/interview", post(assist::handle_interview))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(AppState::bare())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_bare_configuration() {
        let (status, body) = send(request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["configured"]["database"], false);
        assert_eq!(body["configured"]["oauth"], false);
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let routes = [
            (Method::POST, "/sync"),
            (Method::GET, "/applications"),
            (Method::PATCH, "/applications/5f0c7d1e-7f38-4c4e-9a55-3d2b1b8f0a11/status"),
            (Method::DELETE, "/applications/5f0c7d1e-7f38-4c4e-9a55-3d2b1b8f0a11"),
            (Method::GET, "/dashboard"),
            (Method::POST, "/board/move"),
            (Method::POST, "/analyze"),
            (Method::POST, "/interview"),
            (Method::POST, "/auth/logout"),
        ];
        for (method, uri) in routes {
            let (status, body) = send(request(method.clone(), uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"]["code"], "NOT_LOGGED_IN", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_session_token_is_expired() {
        let (status, body) = send(request(Method::GET, "/applications", Some("not-a-uuid"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "SESSION_EXPIRED");
        assert!(body["error"]["hint"].is_string());
    }

    #[tokio::test]
    async fn test_missing_database_is_descriptive_500() {
        let token = "5f0c7d1e-7f38-4c4e-9a55-3d2b1b8f0a11";
        let (status, body) = send(request(Method::GET, "/applications", Some(token))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("DATABASE_URL"));
    }

    #[tokio::test]
    async fn test_login_without_oauth_config_names_variable() {
        let (status, body) = send(request(Method::GET, "/auth/login", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("GOOGLE_CLIENT_ID"));
    }

    #[tokio::test]
    async fn test_callback_rejects_unknown_state() {
        let (status, body) = send(request(
            Method::GET,
            "/auth/callback?code=abc&state=forged",
            None,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
