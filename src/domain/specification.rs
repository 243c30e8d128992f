use sqlx::{Postgres, QueryBuilder};

use super::{Member, MemberWithTeam, Team};

/// A composable predicate over members and their team.
///
/// The same value is evaluated in memory with [`MemberSpec::matches`] and
/// rendered into a `WHERE` clause with [`MemberSpec::push_sql`]. SQL
/// rendering expects the member table aliased as `m` and a left-joined team
/// aliased as `t`.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSpec {
    UserName(String),
    TeamName(String),
    AgeEquals(i32),
    AgeGreaterThan(i32),
    And(Box<MemberSpec>, Box<MemberSpec>),
    Or(Box<MemberSpec>, Box<MemberSpec>),
    All,
}

impl MemberSpec {
    pub fn user_name(name: impl Into<String>) -> Self {
        Self::UserName(name.into())
    }

    pub fn team_name(name: impl Into<String>) -> Self {
        Self::TeamName(name.into())
    }

    pub fn and(self, other: MemberSpec) -> Self {
        match (self, other) {
            (Self::All, spec) | (spec, Self::All) => spec,
            (left, right) => Self::And(Box::new(left), Box::new(right)),
        }
    }

    pub fn or(self, other: MemberSpec) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn matches(&self, row: &MemberWithTeam) -> bool {
        match self {
            Self::UserName(name) => row.member.user_name.as_ref() == name,
            Self::TeamName(name) => row.team_name() == Some(name),
            Self::AgeEquals(age) => row.member.age == *age,
            Self::AgeGreaterThan(age) => row.member.age > *age,
            Self::And(left, right) => left.matches(row) && right.matches(row),
            Self::Or(left, right) => left.matches(row) || right.matches(row),
            Self::All => true,
        }
    }

    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::UserName(name) => {
                builder.push("m.user_name = ").push_bind(name.clone());
            }
            Self::TeamName(name) => {
                builder.push("t.name = ").push_bind(name.clone());
            }
            Self::AgeEquals(age) => {
                builder.push("m.age = ").push_bind(*age);
            }
            Self::AgeGreaterThan(age) => {
                builder.push("m.age > ").push_bind(*age);
            }
            Self::And(left, right) => {
                builder.push("(");
                left.push_sql(builder);
                builder.push(" AND ");
                right.push_sql(builder);
                builder.push(")");
            }
            Self::Or(left, right) => {
                builder.push("(");
                left.push_sql(builder);
                builder.push(" OR ");
                right.push_sql(builder);
                builder.push(")");
            }
            Self::All => {
                builder.push("TRUE");
            }
        }
    }
}

/// Query by example: every field that is set on the probe must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberProbe {
    pub user_name: Option<String>,
    pub age: Option<i32>,
    pub team_name: Option<String>,
}

impl MemberProbe {
    pub fn from_member(member: &Member, team: Option<&Team>) -> Self {
        Self {
            user_name: Some(member.user_name.as_ref().to_owned()),
            age: Some(member.age),
            team_name: team.map(|team| team.name.as_ref().to_owned()),
        }
    }

    pub fn ignoring_age(mut self) -> Self {
        self.age = None;
        self
    }

    pub fn into_spec(self) -> MemberSpec {
        let mut spec = MemberSpec::All;
        if let Some(name) = self.user_name {
            spec = spec.and(MemberSpec::UserName(name));
        }
        if let Some(age) = self.age {
            spec = spec.and(MemberSpec::AgeEquals(age));
        }
        if let Some(team_name) = self.team_name {
            spec = spec.and(MemberSpec::TeamName(team_name));
        }
        spec
    }
}
