//! Read-only shapes of member data. None of these are ever written back.

use serde::{Deserialize, Serialize};

use super::{Member, Team};

/// A member together with its team, loaded in a single joined read.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Option<Team>,
}

impl MemberWithTeam {
    pub fn team_name(&self) -> Option<&String> {
        self.team.as_ref().map(|team| team.name.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: i64,
    pub user_name: String,
    pub team_name: Option<String>,
}

impl MemberDto {
    pub fn new(member: &Member, team_name: Option<String>) -> Self {
        Self {
            id: *member.id().as_ref(),
            user_name: member.user_name.as_ref().to_owned(),
            team_name,
        }
    }
}

impl From<&MemberWithTeam> for MemberDto {
    fn from(row: &MemberWithTeam) -> Self {
        Self::new(&row.member, row.team_name().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNameOnlyDto {
    pub user_name: String,
}

impl From<&MemberWithTeam> for UserNameOnlyDto {
    fn from(row: &MemberWithTeam) -> Self {
        Self {
            user_name: row.member.user_name.as_ref().to_owned(),
        }
    }
}

/// Open projection: the name is computed from several member fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNameOnly {
    pub user_name: String,
}

impl From<&MemberWithTeam> for UserNameOnly {
    fn from(row: &MemberWithTeam) -> Self {
        Self {
            user_name: format!("{} {}", row.member.user_name, row.member.age),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedClosedProjection {
    pub user_name: String,
    pub team: Option<TeamInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
}

impl From<&MemberWithTeam> for NestedClosedProjection {
    fn from(row: &MemberWithTeam) -> Self {
        Self {
            user_name: row.member.user_name.as_ref().to_owned(),
            team: row.team_name().map(|name| TeamInfo { name: name.clone() }),
        }
    }
}

/// Row shape of the paged id/name/team-name projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberProjection {
    pub id: i64,
    pub user_name: String,
    pub team_name: Option<String>,
}

impl From<&MemberWithTeam> for MemberProjection {
    fn from(row: &MemberWithTeam) -> Self {
        Self {
            id: *row.member.id().as_ref(),
            user_name: row.member.user_name.as_ref().to_owned(),
            team_name: row.team_name().cloned(),
        }
    }
}

/// Maps joined rows onto whichever projection the caller asks for.
pub fn project<P>(rows: &[MemberWithTeam]) -> Vec<P>
where
    P: for<'a> From<&'a MemberWithTeam>,
{
    rows.iter().map(P::from).collect()
}
