//! Pull request repository
//!
//! Status lives in a TEXT column constrained to `OPEN` / `MERGED`; the only
//! transition is OPEN -> MERGED via [`PullRequestRepo::mark_merged`].

use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{not_found, UnknownVariant};
use crate::db::{is_unique_violation, Scope, TxManager};
use crate::error::{Error, ErrorKind, Result};

const EXTERNAL_ID_CONSTRAINT: &str = "pull_requests_external_id_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PrStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(UnknownVariant {
                column: "pull_requests.status",
                value,
            }),
        }
    }
}

/// Pull request record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PullRequest {
    pub id: Uuid,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub author_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: PrStatus,
    pub need_more_reviewers: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }
}

/// Pull request repository
pub struct PullRequestRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> PullRequestRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn get_by_id(&self, scope: &Scope, id: Uuid) -> Result<PullRequest> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PullRequest>(
            r#"
            SELECT id, external_id, title, description, author_id, status,
                   need_more_reviewers, created_at, updated_at, merged_at
            FROM pull_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("pull request", id))
    }

    pub async fn get_by_external_id(&self, scope: &Scope, external_id: &str) -> Result<PullRequest> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PullRequest>(
            r#"
            SELECT id, external_id, title, description, author_id, status,
                   need_more_reviewers, created_at, updated_at, merged_at
            FROM pull_requests
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("pull request", external_id))
    }

    /// Like [`Self::get_by_external_id`], holding the row lock until the
    /// surrounding transaction ends. Writers of one PR queue up behind it.
    pub async fn get_by_external_id_for_update(
        &self,
        scope: &Scope,
        external_id: &str,
    ) -> Result<PullRequest> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PullRequest>(
            r#"
            SELECT id, external_id, title, description, author_id, status,
                   need_more_reviewers, created_at, updated_at, merged_at
            FROM pull_requests
            WHERE external_id = $1
            FOR UPDATE
            "#,
        )
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("pull request", external_id))
    }

    /// Insert a pull request; a duplicate external id is `PR_EXISTS`.
    pub async fn create(&self, scope: &Scope, pr: &PullRequest) -> Result<PullRequest> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PullRequest>(
            r#"
            INSERT INTO pull_requests (id, external_id, title, description, author_id, status,
                                       need_more_reviewers, created_at, updated_at, merged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, external_id, title, description, author_id, status,
                      need_more_reviewers, created_at, updated_at, merged_at
            "#,
        )
        .bind(pr.id)
        .bind(&pr.external_id)
        .bind(&pr.title)
        .bind(&pr.description)
        .bind(pr.author_id)
        .bind(pr.status.as_str())
        .bind(pr.need_more_reviewers)
        .bind(pr.created_at)
        .bind(pr.updated_at)
        .bind(pr.merged_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some(EXTERNAL_ID_CONSTRAINT)) {
                Error::wrap(ErrorKind::PrExists, e)
                    .with_message(format!("pull request '{}' already exists", pr.external_id))
            } else {
                e.into()
            }
        })
    }

    /// OPEN -> MERGED. Already-merged rows are left untouched, so a lost
    /// race reports `NOT_FOUND` rather than moving `merged_at`.
    pub async fn mark_merged(
        &self,
        scope: &Scope,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PullRequest> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, PullRequest>(
            r#"
            UPDATE pull_requests
            SET status = 'MERGED', merged_at = $1, updated_at = $1
            WHERE id = $2 AND status = 'OPEN'
            RETURNING id, external_id, title, description, author_id, status,
                      need_more_reviewers, created_at, updated_at, merged_at
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("open pull request", id))
    }
}
