use super::{Audit, MemberId, Team, TeamId, UserName};

/// A stored member. The id is assigned by the store and cannot be changed
/// afterwards, so it is only reachable through [`Member::id`].
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    id: MemberId,
    pub user_name: UserName,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub audit: Audit,
}

impl Member {
    pub fn restore(
        id: MemberId,
        user_name: UserName,
        age: i32,
        team_id: Option<TeamId>,
        audit: Audit,
    ) -> Self {
        Self {
            id,
            user_name,
            age,
            team_id,
            audit,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Points this member at `team` and records it in the team's member
    /// collection, keeping both sides of the association in step.
    pub fn change_team(&mut self, team: &mut Team) {
        self.team_id = Some(team.id());
        if !team.members.contains(&self.id) {
            team.members.push(self.id);
        }
    }

    /// Like [`Member::change_team`], but also drops this member from the
    /// collection of the team it is leaving.
    pub fn move_team(&mut self, from: &mut Team, to: &mut Team) {
        if self.team_id == Some(from.id()) {
            from.members.retain(|id| id != &self.id);
        }
        self.change_team(to);
    }
}

/// A member that has not been handed to a store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub user_name: UserName,
    pub age: i32,
    pub team_id: Option<TeamId>,
}

impl NewMember {
    pub fn new(user_name: UserName, age: i32) -> Self {
        Self {
            user_name,
            age,
            team_id: None,
        }
    }

    pub fn with_team(user_name: UserName, age: i32, team: &Team) -> Self {
        Self {
            user_name,
            age,
            team_id: Some(team.id()),
        }
    }
}
