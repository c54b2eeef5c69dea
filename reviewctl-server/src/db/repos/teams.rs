//! Team repository
//!
//! - create: plain INSERT; a duplicate name is `TEAM_EXISTS`, any other
//!   constraint failure stays internal
//! - lookups by id and by name

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::not_found;
use crate::db::{is_unique_violation, Scope, TxManager};
use crate::error::{Error, ErrorKind, Result};

const NAME_CONSTRAINT: &str = "teams_name_key";

/// Team record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team repository
pub struct TeamRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> TeamRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn get_by_id(&self, scope: &Scope, id: Uuid) -> Result<Team> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, external_id, name, description, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("team", id))
    }

    pub async fn get_by_name(&self, scope: &Scope, name: &str) -> Result<Team> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, external_id, name, description, created_at, updated_at
            FROM teams
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("team", name))
    }

    /// All teams, oldest first.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Team>> {
        let mut conn = self.tx.executor(scope).await?;
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, external_id, name, description, created_at, updated_at
            FROM teams
            ORDER BY created_at, name
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(teams)
    }

    /// Insert a team; a taken name is reported as `TEAM_EXISTS`.
    pub async fn create(&self, scope: &Scope, team: &Team) -> Result<Team> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, external_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, external_id, name, description, created_at, updated_at
            "#,
        )
        .bind(team.id)
        .bind(&team.external_id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.created_at)
        .bind(team.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some(NAME_CONSTRAINT)) {
                Error::wrap(ErrorKind::TeamExists, e)
                    .with_message(format!("team '{}' already exists", team.name))
            } else {
                e.into()
            }
        })
    }
}
