//! Pull request endpoints

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::with_deadline;
use crate::domain::{NewPullRequest, PullRequestView, Reassignment};
use crate::http::error::ApiError;
use crate::http::extractors::ApiJson;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePullRequestRequest {
    #[serde(default)]
    pub pull_request_id: String,
    #[serde(default)]
    pub pull_request_name: String,
    #[serde(default)]
    pub author_id: String,
}

impl From<CreatePullRequestRequest> for NewPullRequest {
    fn from(req: CreatePullRequestRequest) -> Self {
        Self {
            pull_request_id: req.pull_request_id,
            pull_request_name: req.pull_request_name,
            author_id: req.author_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MergePullRequestRequest {
    #[serde(default)]
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    #[serde(default)]
    pub pull_request_id: String,
    #[serde(default)]
    pub old_reviewer_id: String,
}

/// Pull request response
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
    /// RFC3339, present once merged
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
}

impl From<PullRequestView> for PullRequestResponse {
    fn from(pr: PullRequestView) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status.to_string(),
            assigned_reviewers: pr.assigned_reviewers,
            merged_at: pr.merged_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestResponse,
    #[serde(rename = "replacedBy")]
    pub replaced_by: String,
}

impl From<Reassignment> for ReassignResponse {
    fn from(r: Reassignment) -> Self {
        Self {
            pr: r.pr.into(),
            replaced_by: r.replaced_by,
        }
    }
}

/// POST /pullRequest/create - open a PR and assign reviewers
async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePullRequestRequest>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let scope = state.service.scope();
    let pr = with_deadline(&state, state.service.create_pull_request(&scope, req.into())).await?;
    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/merge - idempotent
async fn merge(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<MergePullRequestRequest>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let scope = state.service.scope();
    let pr = with_deadline(
        &state,
        state.service.merge_pull_request(&scope, &req.pull_request_id),
    )
    .await?;
    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// POST /pullRequest/reassign - swap one current reviewer
async fn reassign(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let scope = state.service.scope();
    let outcome = with_deadline(
        &state,
        state
            .service
            .reassign_reviewer(&scope, &req.pull_request_id, &req.old_reviewer_id),
    )
    .await?;
    Ok(Json(outcome.into()))
}

/// Pull request routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pullRequest/create", post(create))
        .route("/pullRequest/merge", post(merge))
        .route("/pullRequest/reassign", post(reassign))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::PrStatus;
    use crate::http::routes::test_support::{offline_router, post_json, send};
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};

    fn view(merged: bool) -> PullRequestView {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        PullRequestView {
            pull_request_id: "pr1".into(),
            pull_request_name: "Add search".into(),
            author_id: "a".into(),
            status: if merged { PrStatus::Merged } else { PrStatus::Open },
            assigned_reviewers: vec!["r1".into(), "r2".into()],
            created_at: created,
            merged_at: merged.then(|| Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn open_pr_has_no_merged_at() {
        let body = serde_json::to_value(PullRequestEnvelope { pr: view(false).into() }).unwrap();
        assert_eq!(body["pr"]["status"], "OPEN");
        assert_eq!(body["pr"]["assigned_reviewers"], serde_json::json!(["r1", "r2"]));
        assert!(body["pr"].get("mergedAt").is_none());
    }

    #[test]
    fn merged_pr_renders_rfc3339() {
        let body = serde_json::to_value(PullRequestEnvelope { pr: view(true).into() }).unwrap();
        assert_eq!(body["pr"]["status"], "MERGED");
        assert_eq!(body["pr"]["mergedAt"], "2024-05-02T10:00:00+00:00");
    }

    #[test]
    fn reassign_uses_camel_case_replacement_key() {
        let outcome = Reassignment {
            pr: view(false),
            replaced_by: "r3".into(),
        };
        let body = serde_json::to_value(ReassignResponse::from(outcome)).unwrap();
        assert_eq!(body["replacedBy"], "r3");
        assert_eq!(body["pr"]["pull_request_id"], "pr1");
    }

    #[tokio::test]
    async fn create_without_author_is_400() {
        let request = post_json(
            "/pullRequest/create",
            r#"{"pull_request_id":"pr1","pull_request_name":"p"}"#,
        );
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_USER_ID");
    }

    #[tokio::test]
    async fn create_without_pull_request_id_is_400() {
        let request = post_json(
            "/pullRequest/create",
            r#"{"pull_request_name":"p","author_id":"a"}"#,
        );
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "no pull_request_id provided");
    }

    #[tokio::test]
    async fn reassign_without_reviewer_is_400() {
        let request = post_json("/pullRequest/reassign", r#"{"pull_request_id":"pr1"}"#);
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_USER_ID");
    }

    #[tokio::test]
    async fn malformed_merge_body_uses_error_envelope() {
        let request = post_json("/pullRequest/merge", "not json");
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }
}
