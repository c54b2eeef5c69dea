use super::model::ReviewQueue;
use super::Service;
use crate::db::repos::{ReviewerRepo, UserRepo};
use crate::db::Scope;
use crate::error::{ErrorKind, Result};

impl Service {
    /// PRs the user is currently assigned to review.
    pub async fn get_review(&self, scope: &Scope, user_id: &str) -> Result<ReviewQueue> {
        if user_id.trim().is_empty() {
            return Err(ErrorKind::NoUserId.into());
        }

        let user = UserRepo::new(&self.tx).get_by_external_id(scope, user_id).await?;
        let pull_requests = ReviewerRepo::new(&self.tx)
            .assigned_pull_requests(scope, user.id)
            .await?;

        Ok(ReviewQueue {
            user_id: user.external_id,
            pull_requests,
        })
    }
}
