//! Statistics endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::with_deadline;
use crate::db::repos::{ReviewerLoad, TeamStats, UserStats};
use crate::domain::Statistics;
use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_prs: i64,
    pub open_prs: i64,
    pub merged_prs: i64,
    pub user_assignments: Vec<UserAssignmentResponse>,
    pub team_stats: Vec<TeamStatsResponse>,
    pub reviewer_load: Vec<ReviewerLoadResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserAssignmentResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: Option<String>,
    pub total_prs: i64,
    pub assigned_as_reviewer: i64,
    pub active_assignments: i64,
}

#[derive(Debug, Serialize)]
pub struct TeamStatsResponse {
    pub team_name: String,
    pub total_prs: i64,
    pub open_prs: i64,
    pub total_reviews: i64,
}

#[derive(Debug, Serialize)]
pub struct ReviewerLoadResponse {
    pub user_id: String,
    pub username: String,
    pub load: i64,
}

impl From<UserStats> for UserAssignmentResponse {
    fn from(u: UserStats) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            team_name: u.team_name,
            total_prs: u.total_prs,
            assigned_as_reviewer: u.assigned_as_reviewer,
            active_assignments: u.active_assignments,
        }
    }
}

impl From<TeamStats> for TeamStatsResponse {
    fn from(t: TeamStats) -> Self {
        Self {
            team_name: t.team_name,
            total_prs: t.total_prs,
            open_prs: t.open_prs,
            total_reviews: t.total_reviews,
        }
    }
}

impl From<ReviewerLoad> for ReviewerLoadResponse {
    fn from(r: ReviewerLoad) -> Self {
        Self {
            user_id: r.user_id,
            username: r.username,
            load: r.load,
        }
    }
}

impl From<Statistics> for StatisticsResponse {
    fn from(s: Statistics) -> Self {
        Self {
            total_prs: s.totals.total_prs,
            open_prs: s.totals.open_prs,
            merged_prs: s.totals.merged_prs,
            user_assignments: s.users.into_iter().map(Into::into).collect(),
            team_stats: s.teams.into_iter().map(Into::into).collect(),
            reviewer_load: s.reviewer_load.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET /statistics/get
async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let scope = state.service.scope();
    let stats = with_deadline(&state, state.service.statistics(&scope)).await?;
    Ok(Json(stats.into()))
}

/// Statistics routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/statistics/get", get(get_statistics))
}
