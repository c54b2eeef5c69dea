//! Aggregate statistics queries
//!
//! Every method is a single statement; per-user and per-team counts are
//! grouped in CTEs and LEFT JOINed so entities with no activity still
//! show up with zero counts.

use sqlx::FromRow;

use crate::db::{Scope, TxManager};
use crate::error::Result;

/// PR totals across the whole service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct PrCounts {
    pub total_prs: i64,
    pub open_prs: i64,
    pub merged_prs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserStats {
    pub user_id: String,
    pub username: String,
    /// First (earliest) team of the user.
    pub team_name: Option<String>,
    /// PRs authored.
    pub total_prs: i64,
    /// Current assignments, any PR status.
    pub assigned_as_reviewer: i64,
    /// Current assignments on OPEN PRs.
    pub active_assignments: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TeamStats {
    pub team_name: String,
    pub total_prs: i64,
    pub open_prs: i64,
    pub total_reviews: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReviewerLoad {
    pub user_id: String,
    pub username: String,
    pub load: i64,
}

/// Statistics repository
pub struct StatisticsRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> StatisticsRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    /// Pin the open transaction to one snapshot. Must run before any
    /// other statement of that transaction.
    pub async fn begin_snapshot(&self, scope: &Scope) -> Result<()> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn pr_counts(&self, scope: &Scope) -> Result<PrCounts> {
        let mut conn = self.tx.executor(scope).await?;
        let counts = sqlx::query_as::<_, PrCounts>(
            r#"
            SELECT COUNT(*) AS total_prs,
                   COUNT(*) FILTER (WHERE status = 'OPEN') AS open_prs,
                   COUNT(*) FILTER (WHERE status = 'MERGED') AS merged_prs
            FROM pull_requests
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(counts)
    }

    /// One row per user, ordered by external id.
    pub async fn user_stats(&self, scope: &Scope) -> Result<Vec<UserStats>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, UserStats>(
            r#"
            WITH first_team AS (
                SELECT DISTINCT ON (tm.user_id) tm.user_id, t.name
                FROM team_members tm
                JOIN teams t ON t.id = tm.team_id
                ORDER BY tm.user_id, tm.created_at, tm.id
            ),
            authored AS (
                SELECT author_id, COUNT(*) AS total
                FROM pull_requests
                GROUP BY author_id
            ),
            reviewing AS (
                SELECT r.reviewer_id,
                       COUNT(*) AS assigned,
                       COUNT(*) FILTER (WHERE p.status = 'OPEN') AS active
                FROM pr_reviewers r
                JOIN pull_requests p ON p.id = r.pr_id
                WHERE r.is_current
                GROUP BY r.reviewer_id
            )
            SELECT u.external_id AS user_id,
                   u.username,
                   ft.name AS team_name,
                   COALESCE(a.total, 0) AS total_prs,
                   COALESCE(rv.assigned, 0) AS assigned_as_reviewer,
                   COALESCE(rv.active, 0) AS active_assignments
            FROM users u
            LEFT JOIN first_team ft ON ft.user_id = u.id
            LEFT JOIN authored a ON a.author_id = u.id
            LEFT JOIN reviewing rv ON rv.reviewer_id = u.id
            ORDER BY u.external_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// One row per team, ordered by name. PRs count toward every team
    /// their author belongs to.
    pub async fn team_stats(&self, scope: &Scope) -> Result<Vec<TeamStats>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, TeamStats>(
            r#"
            WITH authored AS (
                SELECT tm.team_id,
                       COUNT(*) AS total,
                       COUNT(*) FILTER (WHERE p.status = 'OPEN') AS open_total
                FROM team_members tm
                JOIN pull_requests p ON p.author_id = tm.user_id
                GROUP BY tm.team_id
            ),
            reviews AS (
                SELECT team_id, COUNT(*) AS total
                FROM pr_reviewers
                WHERE is_current
                GROUP BY team_id
            )
            SELECT t.name AS team_name,
                   COALESCE(a.total, 0) AS total_prs,
                   COALESCE(a.open_total, 0) AS open_prs,
                   COALESCE(r.total, 0) AS total_reviews
            FROM teams t
            LEFT JOIN authored a ON a.team_id = t.id
            LEFT JOIN reviews r ON r.team_id = t.id
            ORDER BY t.name
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Users with current assignments on OPEN PRs, busiest first.
    pub async fn reviewer_load(&self, scope: &Scope) -> Result<Vec<ReviewerLoad>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, ReviewerLoad>(
            r#"
            SELECT u.external_id AS user_id, u.username, COUNT(*) AS load
            FROM pr_reviewers r
            JOIN pull_requests p ON p.id = r.pr_id
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.is_current AND p.status = 'OPEN'
            GROUP BY u.id, u.external_id, u.username
            ORDER BY load DESC, u.external_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }
}
