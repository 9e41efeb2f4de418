//! Admin API for the key rotation pool
//!
//! Runs on a separate listener (`server.admin_listen_addr`) so it can stay off
//! the public interface. Read-only; key material is never rendered.
//!
//! Endpoints:
//! - GET /admin/rotation: per-slot counters, flags and the active slot
//! - GET /admin/pool: pool health summary

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use gemini_pool::RotationManager;
use tracing::error;

/// Shared state for admin API handlers.
#[derive(Clone)]
pub struct AdminState {
    manager: Arc<RotationManager>,
}

impl AdminState {
    pub fn new(manager: Arc<RotationManager>) -> Self {
        Self { manager }
    }
}

/// Build the admin axum router.
pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/rotation", get(rotation_status))
        .route("/admin/pool", get(pool_status))
        .with_state(state)
}

/// GET /admin/rotation: full rotation snapshot.
async fn rotation_status(State(state): State<AdminState>) -> impl IntoResponse {
    match serde_json::to_string(&state.manager.status()) {
        Ok(body) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        ),
        Err(e) => {
            error!(error = %e, "failed to serialize rotation status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                serde_json::json!({ "error": "failed to serialize rotation status" })
                    .to_string(),
            )
        }
    }
}

/// GET /admin/pool: pool health summary.
async fn pool_status(State(state): State<AdminState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.manager.health().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use provider::{FailureDetail, StaticCredentialSource};
    use tower::ServiceExt;

    fn test_manager(slots: usize) -> Arc<RotationManager> {
        let source = StaticCredentialSource::new()
            .with_key(1, "AIza-secret-one")
            .with_key(2, "AIza-secret-two");
        Arc::new(RotationManager::new(slots, 5, Arc::new(source)).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn rotation_status_reports_slots() {
        let manager = test_manager(2);
        manager.report_success();
        manager.report_failure(&FailureDetail::http(429, "quota exceeded"));

        let app = build_admin_router(AdminState::new(manager));
        let (status, body) = get_json(app, "/admin/rotation").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["current_slot"], 2);
        assert_eq!(json["pool_size"], 2);
        assert_eq!(json["error_threshold"], 5);
        assert_eq!(json["slots"][0]["request_count"], 1);
        assert_eq!(json["slots"][0]["rate_limit_reached"], true);
        assert_eq!(json["slots"][1]["rate_limit_reached"], false);
    }

    #[tokio::test]
    async fn rotation_status_never_contains_keys() {
        let app = build_admin_router(AdminState::new(test_manager(2)));
        let (_, body) = get_json(app, "/admin/rotation").await;
        assert!(!body.contains("AIza-secret"), "key leaked: {body}");
    }

    #[tokio::test]
    async fn pool_status_returns_pool_health() {
        let manager = test_manager(2);
        let app = build_admin_router(AdminState::new(manager.clone()));
        let (status, body) = get_json(app, "/admin/pool").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["keys_total"], 2);

        manager.report_failure(&FailureDetail::http(429, ""));
        let app = build_admin_router(AdminState::new(manager));
        let (_, body) = get_json(app, "/admin/pool").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["keys_rate_limited"], 1);
    }

    #[tokio::test]
    async fn unknown_admin_route_is_404() {
        let app = build_admin_router(AdminState::new(test_manager(1)));
        let (status, _) = get_json(app, "/admin/accounts").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
