use super::model::Statistics;
use super::Service;
use crate::db::repos::StatisticsRepo;
use crate::db::Scope;
use crate::error::Result;

impl Service {
    /// Service-wide counters, read from a single snapshot.
    pub async fn statistics(&self, scope: &Scope) -> Result<Statistics> {
        self.tx
            .transactional(scope, || async {
                let repo = StatisticsRepo::new(&self.tx);
                repo.begin_snapshot(scope).await?;
                Ok(Statistics {
                    totals: repo.pr_counts(scope).await?,
                    users: repo.user_stats(scope).await?,
                    teams: repo.team_stats(scope).await?,
                    reviewer_load: repo.reviewer_load(scope).await?,
                })
            })
            .await
    }
}
