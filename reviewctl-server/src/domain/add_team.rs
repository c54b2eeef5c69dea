use uuid::Uuid;

use super::model::{MemberView, NewTeam, TeamView};
use super::Service;
use crate::db::repos::{Team, TeamMember, TeamMemberRepo, TeamRepo, User, UserRepo, MEMBER_ROLE};
use crate::db::Scope;
use crate::error::{ErrorKind, Result};

impl Service {
    /// Register a team and create its members as new users.
    pub async fn add_team(&self, scope: &Scope, input: NewTeam) -> Result<TeamView> {
        if input.team_name.trim().is_empty() {
            return Err(ErrorKind::NoTeamName.into());
        }
        if input.members.iter().any(|m| m.user_id.trim().is_empty()) {
            return Err(ErrorKind::NoUserId.into());
        }

        self.tx
            .transactional(scope, || async {
                let now = self.now();
                let team = TeamRepo::new(&self.tx)
                    .create(
                        scope,
                        &Team {
                            id: Uuid::new_v4(),
                            external_id: format!("team-{}", Uuid::new_v4().simple()),
                            name: input.team_name.clone(),
                            description: String::new(),
                            created_at: now,
                            updated_at: now,
                        },
                    )
                    .await?;

                let users = UserRepo::new(&self.tx);
                let memberships = TeamMemberRepo::new(&self.tx);
                let mut members = Vec::with_capacity(input.members.len());

                for member in &input.members {
                    // Fresh timestamp per member keeps join order stable.
                    let now = self.now();
                    let user = users
                        .create(
                            scope,
                            &User {
                                id: Uuid::new_v4(),
                                external_id: member.user_id.clone(),
                                username: member.username.clone(),
                                email: member.email(),
                                is_active: member.is_active,
                                created_at: now,
                                updated_at: now,
                            },
                        )
                        .await?;

                    memberships
                        .create(
                            scope,
                            &TeamMember {
                                id: Uuid::new_v4(),
                                team_id: team.id,
                                user_id: user.id,
                                role: MEMBER_ROLE.to_owned(),
                                created_at: now,
                            },
                        )
                        .await?;

                    members.push(MemberView::from(user));
                }

                tracing::info!(team = %team.name, members = members.len(), "team created");

                Ok(TeamView {
                    team_name: team.name,
                    members,
                })
            })
            .await
    }
}
