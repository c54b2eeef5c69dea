//! Use cases
//!
//! [`Service`] bundles what every use case needs: the transaction
//! manager, a clock and a random source. Both of the latter are
//! injectable so tests can pin time and reviewer selection.
//!
//! Each use case takes the request [`Scope`] first and, when it writes,
//! runs as a single unit of work via [`TxManager::transactional`].

pub mod clock;
pub mod model;
pub mod selection;

mod add_team;
mod create_pull_request;
mod get_review;
mod get_team;
mod health;
mod merge_pull_request;
mod reassign_reviewer;
mod set_is_active;
mod statistics;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::db::{Scope, TxManager};
use crate::error::{Error, ErrorKind};

pub use clock::{Clock, FixedClock, SystemClock};
pub use model::{
    MemberView, NewMember, NewPullRequest, NewTeam, PullRequestView, Reassignment, ReviewQueue,
    Statistics, TeamView, UserView,
};

#[derive(Clone)]
pub struct Service {
    tx: TxManager,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<StdRng>>,
}

impl Service {
    /// Production service: wall clock, entropy-seeded RNG.
    pub fn new(tx: TxManager) -> Self {
        Self {
            tx,
            clock: Arc::new(SystemClock),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Deterministic service for tests.
    pub fn with_seed(tx: TxManager, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            tx,
            clock,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn tx(&self) -> &TxManager {
        &self.tx
    }

    /// Fresh request scope.
    pub fn scope(&self) -> Scope {
        self.tx.scope()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave the RNG invalid.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

/// Required request field left empty. No dedicated kind exists, so it is
/// an internal-kind error answered with 400.
pub(crate) fn missing_field(field: &str) -> Error {
    let mut problems = BTreeMap::new();
    problems.insert(field.to_owned(), "must not be empty".to_owned());
    Error::new(ErrorKind::Internal)
        .with_message(format!("no {field} provided"))
        .with_status(400)
        .with_validation_errors(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::params;

    #[test]
    fn missing_field_is_a_bad_request() {
        let err = missing_field("pull_request_id");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), "no pull_request_id provided");
        let problems = err.param(params::VALIDATION_ERRORS).unwrap();
        assert_eq!(problems["pull_request_id"], "must not be empty");
    }
}
