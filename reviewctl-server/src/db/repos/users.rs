//! User repository

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::not_found;
use crate::db::{Scope, TxManager};
use crate::error::Result;

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    tx: &'a TxManager,
}

impl<'a> UserRepo<'a> {
    pub fn new(tx: &'a TxManager) -> Self {
        Self { tx }
    }

    pub async fn get_by_id(&self, scope: &Scope, id: Uuid) -> Result<User> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, email, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("user", id))
    }

    pub async fn get_by_external_id(&self, scope: &Scope, external_id: &str) -> Result<User> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_id, username, email, is_active, created_at, updated_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("user", external_id))
    }

    /// Insert a user. Duplicate external ids surface as internal errors.
    pub async fn create(&self, scope: &Scope, user: &User) -> Result<User> {
        let mut conn = self.tx.executor(scope).await?;
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, external_id, username, email, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, external_id, username, email, is_active, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.external_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// Set `is_active` and bump `updated_at`, returning the updated row.
    pub async fn set_active(
        &self,
        scope: &Scope,
        id: Uuid,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut conn = self.tx.executor(scope).await?;
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, external_id, username, email, is_active, created_at, updated_at
            "#,
        )
        .bind(is_active)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found("user", id))
    }
}
