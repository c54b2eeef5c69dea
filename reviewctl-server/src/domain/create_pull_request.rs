use uuid::Uuid;

use super::model::{NewPullRequest, PullRequestView};
use super::{missing_field, selection, Service};
use crate::db::repos::{
    HistoryRepo, PrReviewer, PrReviewerHistory, PrStatus, PullRequest, PullRequestRepo,
    ReviewerRepo, TeamMemberRepo, UserRepo,
};
use crate::db::Scope;
use crate::error::{Error, ErrorKind, Result};

impl Service {
    /// Open a PR and assign up to two reviewers from the author's team.
    ///
    /// The PR, its reviewer rows and their history entries are written in
    /// one transaction. A team with nobody eligible yields a PR with no
    /// reviewers.
    pub async fn create_pull_request(
        &self,
        scope: &Scope,
        input: NewPullRequest,
    ) -> Result<PullRequestView> {
        if input.pull_request_id.trim().is_empty() {
            return Err(missing_field("pull_request_id"));
        }
        if input.author_id.trim().is_empty() {
            return Err(ErrorKind::NoUserId.into());
        }

        self.tx
            .transactional(scope, || async {
                let prs = PullRequestRepo::new(&self.tx);
                match prs.get_by_external_id(scope, &input.pull_request_id).await {
                    Ok(_) => {
                        return Err(Error::new(ErrorKind::PrExists).with_message(format!(
                            "pull request '{}' already exists",
                            input.pull_request_id
                        )))
                    }
                    Err(e) if e.is(ErrorKind::NotFound) => {}
                    Err(e) => return Err(e),
                }

                let author = UserRepo::new(&self.tx)
                    .get_by_external_id(scope, &input.author_id)
                    .await?;

                let members = TeamMemberRepo::new(&self.tx);
                let team_id = members
                    .list_by_user(scope, author.id)
                    .await?
                    .first()
                    .map(|m| m.team_id)
                    .ok_or_else(|| {
                        Error::internal_msg("author has no team")
                            .with_param("author_id", author.external_id.as_str())
                    })?;

                let now = self.now();
                let pr = prs
                    .create(
                        scope,
                        &PullRequest {
                            id: Uuid::new_v4(),
                            external_id: input.pull_request_id.clone(),
                            title: input.pull_request_name.clone(),
                            description: String::new(),
                            author_id: author.id,
                            status: PrStatus::Open,
                            need_more_reviewers: false,
                            created_at: now,
                            updated_at: now,
                            merged_at: None,
                        },
                    )
                    .await?;

                let team = members.list_users_by_team(scope, team_id).await?;
                let chosen =
                    self.with_rng(|rng| selection::pick_initial_reviewers(rng, &team, author.id));
                tracing::debug!(
                    pr_id = %pr.external_id,
                    team_size = team.len(),
                    chosen = chosen.len(),
                    "initial reviewers selected"
                );

                let reviewers = ReviewerRepo::new(&self.tx);
                let history = HistoryRepo::new(&self.tx);
                for reviewer in &chosen {
                    reviewers
                        .create(scope, &PrReviewer::current(pr.id, reviewer.id, team_id, now))
                        .await?;
                    history
                        .append(
                            scope,
                            &PrReviewerHistory::initial(pr.id, reviewer.id, author.id, now),
                        )
                        .await?;
                }

                let assigned: Vec<String> = chosen.into_iter().map(|u| u.external_id).collect();
                tracing::info!(
                    pr_id = %pr.external_id,
                    author_id = %author.external_id,
                    reviewers = ?assigned,
                    "pull request created"
                );

                Ok(PullRequestView::build(pr, author.external_id, assigned))
            })
            .await
    }
}
