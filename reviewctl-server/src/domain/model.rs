//! Use case inputs and results
//!
//! All identifiers here are external ids; internal UUIDs never leave the
//! domain layer.

use chrono::{DateTime, Utc};

use crate::db::repos::{
    AssignedPullRequest, PrCounts, PrStatus, PullRequest, ReviewerLoad, TeamStats, User, UserStats,
};

/// Team registration request.
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub team_name: String,
    pub members: Vec<NewMember>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
    /// Falls back to a `<user_id>@example.com` placeholder.
    pub email: Option<String>,
}

impl NewMember {
    pub fn email(&self) -> String {
        match &self.email {
            Some(email) if !email.trim().is_empty() => email.clone(),
            _ => format!("{}@example.com", self.user_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamView {
    pub team_name: String,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for MemberView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.external_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// A user together with their primary team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestView {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    /// Current reviewers, oldest assignment first.
    pub assigned_reviewers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestView {
    pub(crate) fn build(pr: PullRequest, author_id: String, assigned_reviewers: Vec<String>) -> Self {
        Self {
            pull_request_id: pr.external_id,
            pull_request_name: pr.title,
            author_id,
            status: pr.status,
            assigned_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub pr: PullRequestView,
    pub replaced_by: String,
}

/// Open review work of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQueue {
    pub user_id: String,
    pub pull_requests: Vec<AssignedPullRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub totals: PrCounts,
    pub users: Vec<UserStats>,
    pub teams: Vec<TeamStats>,
    pub reviewer_load: Vec<ReviewerLoad>,
}
