use super::model::PullRequestView;
use super::Service;
use crate::db::repos::{PullRequestRepo, ReviewerRepo, UserRepo};
use crate::db::Scope;
use crate::error::{ErrorKind, Result};

impl Service {
    /// Move a PR to MERGED. Merging a merged PR returns it unchanged,
    /// first `merged_at` included.
    pub async fn merge_pull_request(
        &self,
        scope: &Scope,
        pull_request_id: &str,
    ) -> Result<PullRequestView> {
        self.tx
            .transactional(scope, || async {
                let prs = PullRequestRepo::new(&self.tx);
                let pr = prs.get_by_external_id(scope, pull_request_id).await?;

                let pr = if pr.is_merged() {
                    tracing::debug!(pr_id = pull_request_id, "pull request already merged");
                    pr
                } else {
                    match prs.mark_merged(scope, pr.id, self.now()).await {
                        Ok(merged) => {
                            tracing::info!(pr_id = pull_request_id, "pull request merged");
                            merged
                        }
                        // Lost the race to a concurrent merge; report its result.
                        Err(e) if e.is(ErrorKind::NotFound) => prs.get_by_id(scope, pr.id).await?,
                        Err(e) => return Err(e),
                    }
                };

                let author = UserRepo::new(&self.tx).get_by_id(scope, pr.author_id).await?;
                let assigned = ReviewerRepo::new(&self.tx)
                    .current_reviewer_ids(scope, pr.id)
                    .await?;

                Ok(PullRequestView::build(pr, author.external_id, assigned))
            })
            .await
    }
}
