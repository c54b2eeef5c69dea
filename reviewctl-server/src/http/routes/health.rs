//! Liveness and readiness probes

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use super::with_deadline;
use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ok: bool,
}

/// GET /health/livez
async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /health/readyz
async fn readyz(State(state): State<Arc<AppState>>) -> Result<Json<ReadinessResponse>, ApiError> {
    let scope = state.service.scope();
    let ok = with_deadline(&state, state.service.readiness(&scope)).await?;
    Ok(Json(ReadinessResponse { ok }))
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/livez", get(livez))
        .route("/health/readyz", get(readyz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::test_support::{get, offline_router, offline_state, send};
    use crate::http::server::build_router;
    use serde_json::Value;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn livez_is_empty_200() {
        let (status, body) = send(offline_router(), get("/health/livez")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn unreachable_database_is_not_ready_within_deadline() {
        let router = build_router(Arc::new(offline_state(Duration::from_secs(3))));
        let started = Instant::now();

        let (status, body) = send(router, get("/health/readyz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "ok": false }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn readiness_body_shape() {
        let body = serde_json::to_value(ReadinessResponse { ok: false }).unwrap();
        assert_eq!(body, serde_json::json!({ "ok": false }));
    }
}
