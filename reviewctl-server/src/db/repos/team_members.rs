//! Team membership repository

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::User;
use crate::db::{Scope, TxManager};
use crate::error::Result;

/// Role given to members created through team registration.
pub const MEMBER_ROLE: &str = "MEMBER";

/// Team membership record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Team membership repository
pub struct TeamMemberRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> TeamMemberRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn create(&self, scope: &Scope, member: &TeamMember) -> Result<TeamMember> {
        let mut conn = self.tx.executor(scope).await?;
        let created = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, team_id, user_id, role, created_at
            "#,
        )
        .bind(member.id)
        .bind(member.team_id)
        .bind(member.user_id)
        .bind(&member.role)
        .bind(member.created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// Memberships of a team in join order.
    pub async fn list_by_team(&self, scope: &Scope, team_id: Uuid) -> Result<Vec<TeamMember>> {
        let mut conn = self.tx.executor(scope).await?;
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, user_id, role, created_at
            FROM team_members
            WHERE team_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(members)
    }

    /// Memberships of a user, earliest first. The first entry is the
    /// user's primary team.
    pub async fn list_by_user(&self, scope: &Scope, user_id: Uuid) -> Result<Vec<TeamMember>> {
        let mut conn = self.tx.executor(scope).await?;
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT id, team_id, user_id, role, created_at
            FROM team_members
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(members)
    }

    /// Users belonging to a team, in join order (single JOIN, no N+1).
    pub async fn list_users_by_team(&self, scope: &Scope, team_id: Uuid) -> Result<Vec<User>> {
        let mut conn = self.tx.executor(scope).await?;
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.external_id, u.username, u.email, u.is_active, u.created_at, u.updated_at
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.created_at, u.external_id
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(users)
    }
}
