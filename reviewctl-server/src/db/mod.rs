//! Database layer - connection pool, transaction scopes and repositories
//!
//! # Design Principles
//!
//! - Bounded connection pool, no Arc<Mutex<Connection>>
//! - Every repository call takes the request [`Scope`] and runs on the
//!   executor the scope resolves to (open transaction or pool)
//! - Rely on DB constraints, translate violations into domain errors

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod tx;

pub use pool::create_pool;
pub use tx::{Executor, Scope, TxManager};

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// True when `err` is a unique-constraint violation, optionally on a
/// specific constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            match constraint {
                Some(name) => db.constraint() == Some(name),
                None => true,
            }
        }
        _ => false,
    }
}
