use super::model::{PullRequestView, Reassignment};
use super::{selection, Service};
use crate::db::repos::{
    HistoryRepo, PrReviewer, PrReviewerHistory, PullRequestRepo, ReviewerRepo, TeamMemberRepo,
    UserRepo,
};
use crate::db::Scope;
use crate::error::{Error, ErrorKind, Result};

impl Service {
    /// Replace one current reviewer of an open PR with another active
    /// member of the team recorded on the replaced assignment.
    pub async fn reassign_reviewer(
        &self,
        scope: &Scope,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment> {
        if old_reviewer_id.trim().is_empty() {
            return Err(ErrorKind::NoUserId.into());
        }

        self.tx
            .transactional(scope, || async {
                // Row lock: concurrent reassignments of this PR see each
                // other's new reviewers.
                let pr = PullRequestRepo::new(&self.tx)
                    .get_by_external_id_for_update(scope, pull_request_id)
                    .await?;
                if pr.is_merged() {
                    return Err(
                        Error::new(ErrorKind::PrMerged).with_param("pr_id", pull_request_id)
                    );
                }

                let users = UserRepo::new(&self.tx);
                let old = users.get_by_external_id(scope, old_reviewer_id).await?;

                let reviewers = ReviewerRepo::new(&self.tx);
                let current = reviewers.current_for_pr(scope, pr.id).await?;
                let replaced = current
                    .iter()
                    .find(|r| r.reviewer_id == old.id)
                    .ok_or_else(|| not_assigned(pull_request_id, old_reviewer_id))?;

                let team = TeamMemberRepo::new(&self.tx)
                    .list_users_by_team(scope, replaced.team_id)
                    .await?;
                let current_ids: Vec<_> = current.iter().map(|r| r.reviewer_id).collect();
                let replacement = self
                    .with_rng(|rng| selection::pick_replacement(rng, &team, old.id, &current_ids))
                    .ok_or_else(|| {
                        Error::new(ErrorKind::NoCandidate).with_param("pr_id", pull_request_id)
                    })?;
                tracing::debug!(
                    pr_id = pull_request_id,
                    team_size = team.len(),
                    replacement = %replacement.external_id,
                    "replacement selected"
                );

                let now = self.now();
                // A concurrent reassignment of the same reviewer committed first.
                reviewers
                    .mark_replaced(scope, replaced.id, now)
                    .await
                    .map_err(|e| {
                        if e.is(ErrorKind::NotFound) {
                            not_assigned(pull_request_id, old_reviewer_id)
                        } else {
                            e
                        }
                    })?;
                reviewers
                    .create(
                        scope,
                        &PrReviewer::current(pr.id, replacement.id, replaced.team_id, now),
                    )
                    .await?;
                HistoryRepo::new(&self.tx)
                    .append(
                        scope,
                        &PrReviewerHistory::reassignment(pr.id, old.id, replacement.id, now),
                    )
                    .await?;

                let author = users.get_by_id(scope, pr.author_id).await?;
                let assigned = reviewers.current_reviewer_ids(scope, pr.id).await?;

                tracing::info!(
                    pr_id = pull_request_id,
                    old_reviewer = old_reviewer_id,
                    new_reviewer = %replacement.external_id,
                    "reviewer reassigned"
                );

                Ok(Reassignment {
                    pr: PullRequestView::build(pr, author.external_id, assigned),
                    replaced_by: replacement.external_id,
                })
            })
            .await
    }
}

fn not_assigned(pull_request_id: &str, reviewer_id: &str) -> Error {
    Error::new(ErrorKind::NotAssigned)
        .with_message(format!(
            "reviewer '{reviewer_id}' is not assigned to pull request '{pull_request_id}'"
        ))
        .with_param("pr_id", pull_request_id)
}
