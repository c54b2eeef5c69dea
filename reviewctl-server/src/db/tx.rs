//! Transaction manager
//!
//! A [`Scope`] is created per request and passed explicitly to every use
//! case and repository call. [`TxManager::transactional`] opens a
//! transaction and parks it in the scope; [`TxManager::executor`] hands
//! out that transaction while it is open and a pooled connection
//! otherwise. A nested `transactional` on a scope that already holds a
//! transaction joins it.
//!
//! The transaction commits when the unit of work returns `Ok`, and rolls
//! back on `Err`, on panic, and when the future is dropped mid-flight
//! (sqlx rolls back a dropped `Transaction`).

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{Error, Result};

type PgTransaction = Transaction<'static, Postgres>;

/// Request-scoped carrier of the active transaction, if any.
#[derive(Default)]
pub struct Scope {
    tx: Mutex<Option<PgTransaction>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn in_transaction(&self) -> bool {
        self.tx.lock().await.is_some()
    }
}

/// Connection a repository statement runs on.
pub enum Executor<'s> {
    Tx(MappedMutexGuard<'s, PgTransaction>),
    Pool(PoolConnection<Postgres>),
}

impl Deref for Executor<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Self::Tx(tx) => &***tx,
            Self::Pool(conn) => &**conn,
        }
    }
}

impl DerefMut for Executor<'_> {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Self::Tx(tx) => &mut ***tx,
            Self::Pool(conn) => &mut **conn,
        }
    }
}

#[derive(Clone)]
pub struct TxManager {
    pool: PgPool,
}

impl TxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fresh request scope with no open transaction.
    pub fn scope(&self) -> Scope {
        Scope::new()
    }

    /// Run `work` as one unit of work on `scope`.
    pub async fn transactional<T, F, Fut>(&self, scope: &Scope, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if scope.in_transaction().await {
            return work().await;
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::internal(e).with_message("failed to begin transaction"))?;
        *scope.tx.lock().await = Some(tx);

        let outcome = AssertUnwindSafe(work()).catch_unwind().await;
        let tx = scope.tx.lock().await.take();

        match outcome {
            Ok(Ok(value)) => {
                if let Some(tx) = tx {
                    tx.commit()
                        .await
                        .map_err(|e| Error::internal(e).with_message("failed to commit transaction"))?;
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                rollback(tx).await;
                Err(err)
            }
            Err(panic) => {
                rollback(tx).await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// The executor for `scope`: its open transaction, else a pooled connection.
    pub async fn executor<'s>(&self, scope: &'s Scope) -> Result<Executor<'s>> {
        // The guard must be gone before the pool await below, or the
        // future stops being `Send`.
        {
            let guard = scope.tx.lock().await;
            if let Ok(tx) = MutexGuard::try_map(guard, Option::as_mut) {
                return Ok(Executor::Tx(tx));
            }
        }

        Ok(Executor::Pool(self.pool.acquire().await?))
    }
}

async fn rollback(tx: Option<PgTransaction>) {
    if let Some(tx) = tx {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "transaction rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // Run with: DATABASE_URL=postgres://... cargo test -p reviewctl-server -- --ignored

    async fn manager() -> TxManager {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("pool creation failed");

        // Tests run in parallel; concurrent CREATE TABLE IF NOT EXISTS can
        // still collide on the catalog.
        let mut setup = pool.begin().await.expect("setup transaction");
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('reviewctl-tx-tests'))")
            .execute(&mut *setup)
            .await
            .expect("setup lock");
        sqlx::query("CREATE TABLE IF NOT EXISTS tx_marker (label TEXT PRIMARY KEY)")
            .execute(&mut *setup)
            .await
            .expect("marker table");
        setup.commit().await.expect("setup commit");

        TxManager::new(pool)
    }

    fn offline_manager() -> TxManager {
        let config = crate::config::Config::from_yaml(
            "database:\n  host: 127.0.0.1\n  port: 1\n  database: offline\n  min_connections: 0\n  acquire_timeout_secs: 1\n",
        )
        .unwrap();
        TxManager::new(crate::db::pool::create_lazy_pool(&config.database).unwrap())
    }

    #[tokio::test]
    async fn executor_future_can_be_spawned() {
        let tx = offline_manager();

        let outcome = tokio::spawn(async move {
            let scope = tx.scope();
            let conn = tx.executor(&scope).await;
            conn.is_ok()
        })
        .await
        .unwrap();

        assert!(!outcome, "nothing listens on port 1");
    }

    #[tokio::test]
    async fn failed_begin_leaves_scope_empty() {
        let tx = offline_manager();
        let scope = tx.scope();

        let result: Result<()> = tx.transactional(&scope, || async { Ok(()) }).await;
        assert!(result.unwrap_err().is(ErrorKind::Internal));
        assert!(!scope.in_transaction().await);
    }

    async fn marker_exists(tx: &TxManager, label: &str) -> bool {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tx_marker WHERE label = $1)")
            .bind(label)
            .fetch_one(tx.pool())
            .await
            .expect("marker query");
        row.0
    }

    async fn insert_marker(tx: &TxManager, scope: &Scope, label: &str) -> Result<()> {
        let mut conn = tx.executor(scope).await?;
        sqlx::query("INSERT INTO tx_marker (label) VALUES ($1)")
            .bind(label)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    fn label(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn commit_on_success() {
        let tx = manager().await;
        let scope = tx.scope();
        let name = label("commit");

        tx.transactional(&scope, || insert_marker(&tx, &scope, &name))
            .await
            .unwrap();

        assert!(!scope.in_transaction().await);
        assert!(marker_exists(&tx, &name).await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rollback_on_error() {
        let tx = manager().await;
        let scope = tx.scope();
        let name = label("rollback");

        let result: Result<()> = tx
            .transactional(&scope, || async {
                insert_marker(&tx, &scope, &name).await?;
                Err::<(), Error>(ErrorKind::NoCandidate.into())
            })
            .await;

        assert!(result.unwrap_err().is(ErrorKind::NoCandidate));
        assert!(!marker_exists(&tx, &name).await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn rollback_on_panic() {
        let tx = manager().await;
        let name = label("panic");

        let task = {
            let tx = tx.clone();
            let name = name.clone();
            tokio::spawn(async move {
                let scope = tx.scope();
                tx.transactional(&scope, || async {
                    insert_marker(&tx, &scope, &name).await?;
                    if !name.is_empty() {
                        panic!("unit of work blew up");
                    }
                    Ok::<(), Error>(())
                })
                .await
            })
        };

        assert!(task.await.unwrap_err().is_panic());
        assert!(!marker_exists(&tx, &name).await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn nested_call_joins_outer_transaction() {
        let tx = manager().await;
        let scope = tx.scope();
        let inner = label("inner");

        let result: Result<()> = tx
            .transactional(&scope, || async {
                tx.transactional(&scope, || insert_marker(&tx, &scope, &inner))
                    .await?;
                // Inner success must not have committed on its own.
                assert!(scope.in_transaction().await);
                Err::<(), Error>(ErrorKind::PrMerged.into())
            })
            .await;

        assert!(result.is_err());
        assert!(!marker_exists(&tx, &inner).await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn executor_without_transaction_uses_pool() {
        let tx = manager().await;
        let scope = tx.scope();
        let name = label("autocommit");

        insert_marker(&tx, &scope, &name).await.unwrap();
        assert!(marker_exists(&tx, &name).await);
    }
}
