//! Schema migrations
//!
//! Idempotent DDL applied at startup inside one transaction.

use sqlx::PgPool;

/// Statements in dependency order.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        external_id TEXT NOT NULL,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_external_id_key UNIQUE (external_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id UUID PRIMARY KEY,
        external_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT teams_external_id_key UNIQUE (external_id),
        CONSTRAINT teams_name_key UNIQUE (name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_members (
        id UUID PRIMARY KEY,
        team_id UUID NOT NULL REFERENCES teams(id),
        user_id UUID NOT NULL REFERENCES users(id),
        role TEXT NOT NULL DEFAULT 'MEMBER',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT team_members_team_user_key UNIQUE (team_id, user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS team_members_user_idx ON team_members (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS pull_requests (
        id UUID PRIMARY KEY,
        external_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        author_id UUID NOT NULL REFERENCES users(id),
        status TEXT NOT NULL DEFAULT 'OPEN',
        need_more_reviewers BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        merged_at TIMESTAMPTZ,
        CONSTRAINT pull_requests_external_id_key UNIQUE (external_id),
        CONSTRAINT pull_requests_status_check CHECK (status IN ('OPEN', 'MERGED')),
        CONSTRAINT pull_requests_merged_at_check CHECK ((status = 'MERGED') = (merged_at IS NOT NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pull_requests_author_idx ON pull_requests (author_id)",
    r#"
    CREATE TABLE IF NOT EXISTS pr_reviewers (
        id UUID PRIMARY KEY,
        pr_id UUID NOT NULL REFERENCES pull_requests(id),
        reviewer_id UUID NOT NULL REFERENCES users(id),
        team_id UUID NOT NULL REFERENCES teams(id),
        assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        replaced_at TIMESTAMPTZ,
        is_current BOOLEAN NOT NULL DEFAULT TRUE,
        CONSTRAINT pr_reviewers_replaced_check CHECK (is_current OR replaced_at IS NOT NULL)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS pr_reviewers_current_key
        ON pr_reviewers (pr_id, reviewer_id) WHERE is_current
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS pr_reviewers_reviewer_current_idx
        ON pr_reviewers (reviewer_id) WHERE is_current
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pr_reviewer_history (
        id UUID PRIMARY KEY,
        pr_id UUID NOT NULL REFERENCES pull_requests(id),
        old_reviewer_id UUID REFERENCES users(id),
        new_reviewer_id UUID NOT NULL REFERENCES users(id),
        changed_by UUID REFERENCES users(id),
        changed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        reason TEXT NOT NULL,
        CONSTRAINT pr_reviewer_history_reason_check CHECK (reason IN ('initial', 'reassignment'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pr_reviewer_history_pr_idx ON pr_reviewer_history (pr_id, changed_at)",
];

/// Apply the schema.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running schema migrations...");

    let mut tx = pool.begin().await?;
    // Serialise concurrent starts of several replicas.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('reviewctl-schema'))")
        .execute(&mut *tx)
        .await?;

    for statement in SCHEMA {
        sqlx::query(*statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::info!(statements = SCHEMA.len(), "Schema migrations applied");
    Ok(())
}
