//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Every call takes the request [`Scope`](crate::db::Scope) and runs on
//!   the executor the [`TxManager`](crate::db::TxManager) resolves for it
//! - Single-row lookups map "no row" to `NOT_FOUND`
//! - Updates return the post-update row; zero rows updated is `NOT_FOUND`
//! - List operations use JOINs (no N+1) and return empty vectors, never errors

pub mod history;
pub mod pull_requests;
pub mod reviewers;
pub mod statistics;
pub mod team_members;
pub mod teams;
pub mod users;

use std::fmt::Display;

use crate::error::Error;

pub use history::{HistoryReason, HistoryRepo, PrReviewerHistory};
pub use pull_requests::{PrStatus, PullRequest, PullRequestRepo};
pub use reviewers::{AssignedPullRequest, PrReviewer, ReviewerRepo};
pub use statistics::{PrCounts, ReviewerLoad, StatisticsRepo, TeamStats, UserStats};
pub use team_members::{TeamMember, TeamMemberRepo, MEMBER_ROLE};
pub use teams::{Team, TeamRepo};
pub use users::{User, UserRepo};

/// Unknown string stored in an enum-like TEXT column.
#[derive(Debug, thiserror::Error)]
#[error("unknown {column} value '{value}'")]
pub struct UnknownVariant {
    pub column: &'static str,
    pub value: String,
}

pub(crate) fn not_found(resource: &'static str, id: impl Display) -> Error {
    Error::not_found()
        .with_message(format!("{resource} '{id}' not found"))
        .with_param("resource", resource)
}
