//! Reviewer history repository (append-only)

use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;
use crate::db::{Scope, TxManager};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReason {
    Initial,
    Reassignment,
}

impl HistoryReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Reassignment => "reassignment",
        }
    }
}

impl fmt::Display for HistoryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for HistoryReason {
    type Error = UnknownVariant;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "initial" => Ok(Self::Initial),
            "reassignment" => Ok(Self::Reassignment),
            _ => Err(UnknownVariant {
                column: "pr_reviewer_history.reason",
                value,
            }),
        }
    }
}

/// History record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PrReviewerHistory {
    pub id: Uuid,
    pub pr_id: Uuid,
    pub old_reviewer_id: Option<Uuid>,
    pub new_reviewer_id: Uuid,
    /// `None` for system actions.
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub reason: HistoryReason,
}

impl PrReviewerHistory {
    pub fn initial(pr_id: Uuid, reviewer_id: Uuid, author_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pr_id,
            old_reviewer_id: None,
            new_reviewer_id: reviewer_id,
            changed_by: Some(author_id),
            changed_at: now,
            reason: HistoryReason::Initial,
        }
    }

    pub fn reassignment(pr_id: Uuid, old_id: Uuid, new_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pr_id,
            old_reviewer_id: Some(old_id),
            new_reviewer_id: new_id,
            changed_by: None,
            changed_at: now,
            reason: HistoryReason::Reassignment,
        }
    }
}

/// Reviewer history repository
pub struct HistoryRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> HistoryRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn append(&self, scope: &Scope, entry: &PrReviewerHistory) -> Result<PrReviewerHistory> {
        let mut conn = self.tx.executor(scope).await?;
        let created = sqlx::query_as::<_, PrReviewerHistory>(
            r#"
            INSERT INTO pr_reviewer_history
                (id, pr_id, old_reviewer_id, new_reviewer_id, changed_by, changed_at, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, pr_id, old_reviewer_id, new_reviewer_id, changed_by, changed_at, reason
            "#,
        )
        .bind(entry.id)
        .bind(entry.pr_id)
        .bind(entry.old_reviewer_id)
        .bind(entry.new_reviewer_id)
        .bind(entry.changed_by)
        .bind(entry.changed_at)
        .bind(entry.reason.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// History of a PR in the order it was written.
    pub async fn list_for_pr(&self, scope: &Scope, pr_id: Uuid) -> Result<Vec<PrReviewerHistory>> {
        let mut conn = self.tx.executor(scope).await?;
        let rows = sqlx::query_as::<_, PrReviewerHistory>(
            r#"
            SELECT id, pr_id, old_reviewer_id, new_reviewer_id, changed_by, changed_at, reason
            FROM pr_reviewer_history
            WHERE pr_id = $1
            ORDER BY changed_at, id
            "#,
        )
        .bind(pr_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassignment_is_a_system_action() {
        let now = Utc::now();
        let entry = PrReviewerHistory::reassignment(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), now);
        assert_eq!(entry.changed_by, None);
        assert!(entry.old_reviewer_id.is_some());
        assert_eq!(entry.reason, HistoryReason::Reassignment);
    }

    #[test]
    fn initial_entry_is_attributed_to_author() {
        let author = Uuid::new_v4();
        let entry = PrReviewerHistory::initial(Uuid::new_v4(), Uuid::new_v4(), author, Utc::now());
        assert_eq!(entry.changed_by, Some(author));
        assert_eq!(entry.old_reviewer_id, None);
        assert_eq!(HistoryReason::try_from("initial".to_owned()).unwrap(), entry.reason);
    }
}
