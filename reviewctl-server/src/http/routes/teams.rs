//! Team endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::with_deadline;
use crate::domain::{MemberView, NewMember, NewTeam, TeamView};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery};
use crate::http::server::AppState;

/// Add team request
#[derive(Debug, Deserialize)]
pub struct AddTeamRequest {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<MemberRequest>,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<AddTeamRequest> for NewTeam {
    fn from(req: AddTeamRequest) -> Self {
        Self {
            team_name: req.team_name,
            members: req
                .members
                .into_iter()
                .map(|m| NewMember {
                    user_id: m.user_id,
                    username: m.username,
                    is_active: m.is_active,
                    email: m.email,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    #[serde(default)]
    pub team_name: String,
}

/// Team response
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<MemberResponse>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl From<MemberView> for MemberResponse {
    fn from(m: MemberView) -> Self {
        Self {
            user_id: m.user_id,
            username: m.username,
            is_active: m.is_active,
        }
    }
}

impl From<TeamView> for TeamResponse {
    fn from(t: TeamView) -> Self {
        Self {
            team_name: t.team_name,
            members: t.members.into_iter().map(MemberResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddTeamResponse {
    pub team: TeamResponse,
}

/// POST /teams/add - create a team and its members
async fn add_team(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AddTeamRequest>,
) -> Result<Json<AddTeamResponse>, ApiError> {
    let scope = state.service.scope();
    let team = with_deadline(&state, state.service.add_team(&scope, req.into())).await?;
    Ok(Json(AddTeamResponse { team: team.into() }))
}

/// GET /teams/get?team_name=... - a team with its members
async fn get_team(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TeamQuery>,
) -> Result<Json<TeamResponse>, ApiError> {
    let scope = state.service.scope();
    let team = with_deadline(&state, state.service.get_team(&scope, &query.team_name)).await?;
    Ok(Json(team.into()))
}

/// Team routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teams/add", post(add_team))
        .route("/teams/get", get(get_team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::test_support::{get, offline_router, post_json, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn missing_team_name_is_400() {
        let (status, body) = send(offline_router(), get("/teams/get")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_TEAM_NAME");
    }

    #[tokio::test]
    async fn blank_team_name_is_400() {
        let (status, body) = send(offline_router(), get("/teams/get?team_name=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_TEAM_NAME");
    }

    #[tokio::test]
    async fn add_team_without_name_is_400() {
        let request = post_json("/teams/add", r#"{"members":[]}"#);
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_TEAM_NAME");
    }

    #[tokio::test]
    async fn add_team_member_without_id_is_400() {
        let request = post_json(
            "/teams/add",
            r#"{"team_name":"t1","members":[{"user_id":"","username":"U","is_active":true}]}"#,
        );
        let (status, body) = send(offline_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NO_USER_ID");
    }

    #[tokio::test]
    async fn malformed_json_uses_error_envelope() {
        let request = post_json("/teams/add", r#"{"team_name": "t1", "members": ["#);
        let (status, body) = send(offline_router(), request).await;
        assert!(status.is_client_error());
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn response_shape() {
        let team = TeamView {
            team_name: "t1".into(),
            members: vec![MemberView {
                user_id: "u1".into(),
                username: "U1".into(),
                is_active: true,
            }],
        };
        let body = serde_json::to_value(AddTeamResponse { team: team.into() }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "team": {
                    "team_name": "t1",
                    "members": [{ "user_id": "u1", "username": "U1", "is_active": true }]
                }
            })
        );
    }

    #[test]
    fn email_is_optional_in_requests() {
        let req: AddTeamRequest = serde_json::from_str(
            r#"{"team_name":"t","members":[{"user_id":"u1","username":"U1","is_active":true}]}"#,
        )
        .unwrap();
        let team = NewTeam::from(req);
        assert_eq!(team.members[0].email(), "u1@example.com");
    }
}
