use super::model::{MemberView, TeamView};
use super::Service;
use crate::db::repos::{TeamMemberRepo, TeamRepo};
use crate::db::Scope;
use crate::error::{ErrorKind, Result};

impl Service {
    pub async fn get_team(&self, scope: &Scope, team_name: &str) -> Result<TeamView> {
        if team_name.trim().is_empty() {
            return Err(ErrorKind::NoTeamName.into());
        }

        let team = TeamRepo::new(&self.tx).get_by_name(scope, team_name).await?;
        let members = TeamMemberRepo::new(&self.tx)
            .list_users_by_team(scope, team.id)
            .await?;

        Ok(TeamView {
            team_name: team.name,
            members: members.into_iter().map(MemberView::from).collect(),
        })
    }
}
