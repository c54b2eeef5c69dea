//! Reviewer assignment repository
//!
//! A row is created current (`is_current = true`, `replaced_at = NULL`)
//! and may later be marked replaced, which is terminal. The partial
//! unique index `pr_reviewers_current_key` keeps at most one current row
//! per (PR, reviewer).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{not_found, PrStatus};
use crate::db::{Scope, TxManager};
use crate::error::Result;

/// Reviewer assignment record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PrReviewer {
    pub id: Uuid,
    pub pr_id: Uuid,
    pub reviewer_id: Uuid,
    pub team_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub replaced_at: Option<DateTime<Utc>>,
    pub is_current: bool,
}

impl PrReviewer {
    /// Fresh current assignment.
    pub fn current(pr_id: Uuid, reviewer_id: Uuid, team_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pr_id,
            reviewer_id,
            team_id,
            assigned_at: now,
            replaced_at: None,
            is_current: true,
        }
    }
}

/// Pull request a user currently reviews, with external ids resolved.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AssignedPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    #[sqlx(try_from = "String")]
    pub status: PrStatus,
}

/// Reviewer assignment repository
pub struct ReviewerRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> ReviewerRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn create(&self, scope: &Scope, reviewer: &PrReviewer) -> Result<PrReviewer> {
        let mut conn = self.tx.executor(scope).await?;
        let created = sqlx::query_as::<_, PrReviewer>(
            r#"
            INSERT INTO pr_reviewers (id, pr_id, reviewer_id, team_id, assigned_at, replaced_at, is_current)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, pr_id, reviewer_id, team_id, assigned_at, replaced_at, is_current
            "#,
        )
        .bind(reviewer.id)
        .bind(reviewer.pr_id)
        .bind(reviewer.reviewer_id)
        .bind(reviewer.team_id)
        .bind(reviewer.assigned_at)
        .bind(reviewer.replaced_at)
        .bind(reviewer.is_current)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// Current assignments of a PR, oldest first.
    pub async fn current_for_pr(&self, scope: &Scope, pr_id: Uuid) -> Result<Vec<PrReviewer>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, PrReviewer>(
            r#"
            SELECT id, pr_id, reviewer_id, team_id, assigned_at, replaced_at, is_current
            FROM pr_reviewers
            WHERE pr_id = $1 AND is_current
            ORDER BY assigned_at, id
            "#,
        )
        .bind(pr_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// External ids of a PR's current reviewers, oldest assignment first.
    pub async fn current_reviewer_ids(&self, scope: &Scope, pr_id: Uuid) -> Result<Vec<String>> {
        let mut conn = self.tx.executor(scope).await?;
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.external_id
            FROM pr_reviewers r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.pr_id = $1 AND r.is_current
            ORDER BY r.assigned_at, u.external_id
            "#,
        )
        .bind(pr_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// Current assignments held by a reviewer.
    pub async fn current_for_reviewer(
        &self,
        scope: &Scope,
        reviewer_id: Uuid,
    ) -> Result<Vec<PrReviewer>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, PrReviewer>(
            r#"
            SELECT id, pr_id, reviewer_id, team_id, assigned_at, replaced_at, is_current
            FROM pr_reviewers
            WHERE reviewer_id = $1 AND is_current
            ORDER BY assigned_at, id
            "#,
        )
        .bind(reviewer_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// PRs a reviewer is currently assigned to, joined with PR and author.
    pub async fn assigned_pull_requests(
        &self,
        scope: &Scope,
        reviewer_id: Uuid,
    ) -> Result<Vec<AssignedPullRequest>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, AssignedPullRequest>(
            r#"
            SELECT p.external_id AS pull_request_id,
                   p.title AS pull_request_name,
                   a.external_id AS author_id,
                   p.status
            FROM pr_reviewers r
            JOIN pull_requests p ON p.id = r.pr_id
            JOIN users a ON a.id = p.author_id
            WHERE r.reviewer_id = $1 AND r.is_current
            ORDER BY r.assigned_at, p.external_id
            "#,
        )
        .bind(reviewer_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Mark a current assignment replaced. A row that is no longer current
    /// is `NOT_FOUND`.
    pub async fn mark_replaced(
        &self,
        scope: &Scope,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PrReviewer> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PrReviewer>(
            r#"
            UPDATE pr_reviewers
            SET is_current = FALSE, replaced_at = $1
            WHERE id = $2 AND is_current
            RETURNING id, pr_id, reviewer_id, team_id, assigned_at, replaced_at, is_current
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("current reviewer assignment", id))
    }
}
