use super::{Audit, MemberId, TeamId, TeamName};

/// A stored team. `members` is the inverse side of `Member::team_id`; it is
/// filled on read and never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: TeamId,
    pub name: TeamName,
    pub members: Vec<MemberId>,
    pub audit: Audit,
}

impl Team {
    pub fn restore(
        id: TeamId,
        name: TeamName,
        members: Vec<MemberId>,
        audit: Audit,
    ) -> Self {
        Self {
            id,
            name,
            members,
            audit,
        }
    }

    pub fn id(&self) -> TeamId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub name: TeamName,
}

impl NewTeam {
    pub fn new(name: TeamName) -> Self {
        Self { name }
    }
}
