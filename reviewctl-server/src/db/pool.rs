//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits taken from the
//! `database` config section.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{ConfigError, DatabaseSection};

/// Idle connections above `min_connections` are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the section is invalid or the first connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.database).await?;
/// ```
pub async fn create_pool(section: &DatabaseSection) -> Result<PgPool, PoolError> {
    let options = section.connect_options()?;
    let pool = pool_options(section).connect_with(options).await?;
    Ok(pool)
}

/// Pool that connects on first use; handy for tests that never touch the DB.
pub fn create_lazy_pool(section: &DatabaseSection) -> Result<PgPool, PoolError> {
    let options = section.connect_options()?;
    Ok(pool_options(section).connect_lazy_with(options))
}

fn pool_options(section: &DatabaseSection) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(section.max_connections)
        .min_connections(section.min_connections.min(section.max_connections))
        .acquire_timeout(section.acquire_timeout())
        .idle_timeout(IDLE_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p reviewctl-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("pool creation failed");

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    let result: (i32,) = sqlx::query_as("SELECT $1::int")
                        .bind(i)
                        .fetch_one(&pool)
                        .await
                        .expect("concurrent query failed");
                    result.0
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i32);
        }
    }

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let section = crate::config::Config::from_yaml(
            "database:\n  host: 127.0.0.1\n  port: 1\n  database: none\n  min_connections: 0\n",
        )
        .unwrap()
        .database;
        let pool = create_lazy_pool(&section).unwrap();
        assert_eq!(pool.size(), 0);
    }
}
