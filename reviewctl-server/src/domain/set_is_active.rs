use super::model::UserView;
use super::Service;
use crate::db::repos::{TeamMemberRepo, TeamRepo, UserRepo};
use crate::db::Scope;
use crate::error::{Error, ErrorKind, Result};

impl Service {
    /// Flip a user's `is_active` flag. The response carries the user's
    /// primary (earliest) team, so a user without a team is an error.
    pub async fn set_is_active(&self, scope: &Scope, user_id: &str, is_active: bool) -> Result<UserView> {
        if user_id.trim().is_empty() {
            return Err(ErrorKind::NoUserId.into());
        }

        self.tx
            .transactional(scope, || async {
                let users = UserRepo::new(&self.tx);
                let user = users.get_by_external_id(scope, user_id).await?;
                let user = users.set_active(scope, user.id, is_active, self.now()).await?;

                let memberships = TeamMemberRepo::new(&self.tx).list_by_user(scope, user.id).await?;
                let primary = memberships.first().ok_or_else(|| {
                    Error::internal_msg("user has no team").with_param("user_id", user_id)
                })?;
                let team = TeamRepo::new(&self.tx).get_by_id(scope, primary.team_id).await?;

                tracing::info!(user_id, is_active, team = %team.name, "user activity changed");

                Ok(UserView {
                    user_id: user.external_id,
                    username: user.username,
                    team_name: team.name,
                    is_active: user.is_active,
                })
            })
            .await
    }
}
