//! User endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::with_deadline;
use crate::db::repos::AssignedPullRequest;
use crate::domain::{ReviewQueue, UserView};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery};
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SetIsActiveRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<UserView> for UserResponse {
    fn from(u: UserView) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            team_name: u.team_name,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetIsActiveResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortResponse>,
}

#[derive(Debug, Serialize)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<AssignedPullRequest> for PullRequestShortResponse {
    fn from(pr: AssignedPullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status.to_string(),
        }
    }
}

impl From<ReviewQueue> for ReviewResponse {
    fn from(q: ReviewQueue) -> Self {
        Self {
            user_id: q.user_id,
            pull_requests: q
                .pull_requests
                .into_iter()
                .map(PullRequestShortResponse::from)
                .collect(),
        }
    }
}

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SetIsActiveRequest>,
) -> Result<Json<SetIsActiveResponse>, ApiError> {
    let scope = state.service.scope();
    let user = with_deadline(
        &state,
        state.service.set_is_active(&scope, &req.user_id, req.is_active),
    )
    .await?;
    Ok(Json(SetIsActiveResponse { user: user.into() }))
}

/// GET /users/getReview?user_id=... - PRs the user currently reviews
async fn get_review(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let scope = state.service.scope();
    let queue = with_deadline(&state, state.service.get_review(&scope, &query.user_id)).await?;
    Ok(Json(queue.into()))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::PrStatus;
    use crate::http::routes::test_support::{get, offline_router, post_json, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn get_review_without_user_id_is_400() {
        let (status, body) = send(offline_router(), get("/users/getReview")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_USER_ID");
    }

    #[tokio::test]
    async fn set_is_active_without_user_id_is_400() {
        let request = post_json("/users/setIsActive", r#"{"is_active":false}"#);
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_USER_ID");
    }

    #[tokio::test]
    async fn wrong_content_type_uses_error_envelope() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/users/setIsActive")
            .body(axum::body::Body::from(r#"{"user_id":"u1"}"#))
            .unwrap();
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn review_response_shape() {
        let queue = ReviewQueue {
            user_id: "r1".into(),
            pull_requests: vec![AssignedPullRequest {
                pull_request_id: "pr1".into(),
                pull_request_name: "p".into(),
                author_id: "a".into(),
                status: PrStatus::Open,
            }],
        };
        let body = serde_json::to_value(ReviewResponse::from(queue)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "user_id": "r1",
                "pull_requests": [{
                    "pull_request_id": "pr1",
                    "pull_request_name": "p",
                    "author_id": "a",
                    "status": "OPEN"
                }]
            })
        );
    }
}
