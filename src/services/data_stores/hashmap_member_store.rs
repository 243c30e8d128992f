use std::collections::BTreeMap;

use color_eyre::eyre::eyre;

use crate::domain::{
    Audit, Direction, Member, MemberDto, MemberId, MemberProjection,
    MemberSortKey, MemberSpec, MemberStore, MemberStoreError, MemberWithTeam,
    NewMember, NewTeam, Page, PageRequest, Slice, Sort, Team, TeamId,
    TeamStore, TeamStoreError, UserName,
};

/// In-memory tables for both members and teams, so that joined reads see
/// the same data the member side writes.
#[derive(Default)]
pub struct HashmapMemberStore {
    members: BTreeMap<MemberId, Member>,
    teams: BTreeMap<TeamId, Team>,
    last_member_id: i64,
    last_team_id: i64,
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl HashmapMemberStore {
    fn check_team(&self, team_id: Option<TeamId>) -> Result<(), MemberStoreError> {
        match team_id {
            Some(id) if !self.teams.contains_key(&id) => {
                Err(MemberStoreError::TeamIDNotFound)
            }
            _ => Ok(()),
        }
    }

    fn with_members(&self, team: &Team) -> Team {
        let team_id = team.id();
        let mut team = team.clone();
        team.members = self
            .members
            .values()
            .filter(|member| member.team_id == Some(team_id))
            .map(Member::id)
            .collect();
        team
    }

    fn joined(&self, member: &Member) -> MemberWithTeam {
        MemberWithTeam {
            member: member.clone(),
            team: member
                .team_id
                .and_then(|id| self.teams.get(&id))
                .map(|team| self.with_members(team)),
        }
    }

    fn sorted<'a, I>(members: I, sort: Sort) -> Vec<Member>
    where
        I: Iterator<Item = &'a Member>,
    {
        let mut members: Vec<Member> = members.cloned().collect();
        members.sort_by(|a, b| sort.compare(a, b));
        members
    }

    fn window(members: Vec<Member>, offset: u64, limit: u64) -> Vec<Member> {
        members
            .into_iter()
            .skip(to_usize(offset))
            .take(to_usize(limit))
            .collect()
    }

    fn named<'a>(
        &'a self,
        user_name: &'a UserName,
    ) -> impl Iterator<Item = &'a Member> + 'a {
        self.members
            .values()
            .filter(move |member| &member.user_name == user_name)
    }

    fn single(members: Vec<Member>) -> Result<Option<Member>, MemberStoreError> {
        let mut members = members.into_iter();
        match (members.next(), members.next()) {
            (Some(_), Some(_)) => Err(MemberStoreError::NonUniqueResult),
            (member, _) => Ok(member),
        }
    }
}

#[async_trait::async_trait]
impl MemberStore for HashmapMemberStore {
    async fn save(
        &mut self,
        member: NewMember,
    ) -> Result<Member, MemberStoreError> {
        self.check_team(member.team_id)?;

        self.last_member_id += 1;
        let saved = Member::restore(
            MemberId::new(self.last_member_id),
            member.user_name,
            member.age,
            member.team_id,
            Audit::on_persist(),
        );
        self.members.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    async fn update(
        &mut self,
        member: &Member,
    ) -> Result<Member, MemberStoreError> {
        self.check_team(member.team_id)?;

        let stored = self
            .members
            .get_mut(&member.id())
            .ok_or(MemberStoreError::MemberIDNotFound)?;

        let mut audit = stored.audit;
        audit.on_update();
        *stored = Member::restore(
            member.id(),
            member.user_name.clone(),
            member.age,
            member.team_id,
            audit,
        );
        Ok(stored.clone())
    }

    async fn delete(&mut self, id: &MemberId) -> Result<(), MemberStoreError> {
        match self.members.remove(id) {
            Some(_) => Ok(()),
            None => Err(MemberStoreError::MemberIDNotFound),
        }
    }

    async fn find_by_id(
        &self,
        id: &MemberId,
    ) -> Result<Member, MemberStoreError> {
        match self.members.get(id) {
            Some(member) => Ok(member.clone()),
            None => Err(MemberStoreError::MemberIDNotFound),
        }
    }

    async fn find_all(&self) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self.members.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64, MemberStoreError> {
        Ok(self.members.len() as u64)
    }

    async fn find_by_user_name_and_age_greater_than(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self
            .named(user_name)
            .filter(|member| member.age > age)
            .cloned()
            .collect())
    }

    async fn find_top(
        &self,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self.members.values().take(to_usize(limit)).cloned().collect())
    }

    async fn find_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self.named(user_name).cloned().collect())
    }

    async fn find_user(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self
            .named(user_name)
            .filter(|member| member.age == age)
            .cloned()
            .collect())
    }

    async fn find_user_name_list(
        &self,
    ) -> Result<Vec<UserName>, MemberStoreError> {
        Ok(self
            .members
            .values()
            .map(|member| member.user_name.clone())
            .collect())
    }

    async fn find_member_dto(&self) -> Result<Vec<MemberDto>, MemberStoreError> {
        Ok(self
            .members
            .values()
            .map(|member| self.joined(member))
            .filter(|row| row.team.is_some())
            .map(|row| MemberDto::from(&row))
            .collect())
    }

    async fn find_by_names(
        &self,
        names: &[UserName],
    ) -> Result<Vec<Member>, MemberStoreError> {
        Ok(self
            .members
            .values()
            .filter(|member| names.contains(&member.user_name))
            .cloned()
            .collect())
    }

    async fn find_optional_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Option<Member>, MemberStoreError> {
        Self::single(self.named(user_name).cloned().collect())
    }

    async fn find_member_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError> {
        Self::single(self.named(user_name).cloned().collect())?
            .ok_or(MemberStoreError::MemberNotFound)
    }

    async fn find_page(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError> {
        let members = Self::sorted(self.members.values(), request.sort());
        let total = members.len() as u64;
        let content = Self::window(members, request.offset(), request.size());
        Ok(Page::new(content, request, total))
    }

    async fn find_paging_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError> {
        let members = Self::sorted(
            self.members.values().filter(|member| member.age == age),
            request.sort(),
        );
        // Count covers all members, not only this age.
        let total = self.members.len() as u64;
        let content = Self::window(members, request.offset(), request.size());
        Ok(Page::new(content, request, total))
    }

    async fn find_slice_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Slice<Member>, MemberStoreError> {
        let members = Self::sorted(
            self.members.values().filter(|member| member.age == age),
            request.sort(),
        );
        let rows = Self::window(
            members,
            request.offset(),
            request.size().saturating_add(1),
        );
        Ok(Slice::from_overfetch(rows, request))
    }

    async fn find_by_page(
        &self,
        age: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError> {
        let members = Self::sorted(
            self.members.values().filter(|member| member.age == age),
            Sort::by(MemberSortKey::UserName, Direction::Desc),
        );
        Ok(Self::window(members, offset, limit))
    }

    async fn total_count(&self, age: i32) -> Result<u64, MemberStoreError> {
        Ok(self
            .members
            .values()
            .filter(|member| member.age == age)
            .count() as u64)
    }

    async fn bulk_age_plus(
        &mut self,
        age: i32,
    ) -> Result<u64, MemberStoreError> {
        if let Some(member) = self
            .members
            .values()
            .find(|m| m.age >= age && m.age.checked_add(1).is_none())
        {
            return Err(MemberStoreError::UnexpectedError(eyre!(
                "age of member {} is out of range",
                member.id()
            )));
        }

        let mut updated = 0;
        for member in self.members.values_mut().filter(|m| m.age >= age) {
            member.age += 1;
            member.audit.on_update();
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_member_fetch_join(
        &self,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        Ok(self
            .members
            .values()
            .map(|member| self.joined(member))
            .collect())
    }

    async fn find_entity_graph_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        Ok(self
            .named(user_name)
            .map(|member| self.joined(member))
            .collect())
    }

    async fn find_read_only_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError> {
        self.find_member_by_user_name(user_name).await
    }

    async fn find_lock_by_user_name(
        &mut self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError> {
        self.find_by_user_name(user_name).await
    }

    async fn find_projections_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        self.find_entity_graph_by_user_name(user_name).await
    }

    async fn find_by_native_projection(
        &self,
        request: &PageRequest,
    ) -> Result<Page<MemberProjection>, MemberStoreError> {
        let members = Self::sorted(self.members.values(), request.sort());
        let total = members.len() as u64;
        let content = Self::window(members, request.offset(), request.size())
            .iter()
            .map(|member| MemberProjection::from(&self.joined(member)))
            .collect();
        Ok(Page::new(content, request, total))
    }

    async fn find_all_matching(
        &self,
        spec: &MemberSpec,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError> {
        Ok(self
            .members
            .values()
            .map(|member| self.joined(member))
            .filter(|row| spec.matches(row))
            .collect())
    }
}

#[async_trait::async_trait]
impl TeamStore for HashmapMemberStore {
    async fn save_team(&mut self, team: NewTeam) -> Result<Team, TeamStoreError> {
        self.last_team_id += 1;
        let saved = Team::restore(
            TeamId::new(self.last_team_id),
            team.name,
            Vec::new(),
            Audit::on_persist(),
        );
        self.teams.insert(saved.id(), saved.clone());
        Ok(saved)
    }

    async fn delete_team(&mut self, id: &TeamId) -> Result<(), TeamStoreError> {
        if !self.teams.contains_key(id) {
            return Err(TeamStoreError::TeamIDNotFound);
        }
        if self.members.values().any(|m| m.team_id.as_ref() == Some(id)) {
            return Err(TeamStoreError::TeamHasMembers);
        }
        self.teams.remove(id);
        Ok(())
    }

    async fn find_all_teams(&self) -> Result<Vec<Team>, TeamStoreError> {
        Ok(self
            .teams
            .values()
            .map(|team| self.with_members(team))
            .collect())
    }

    async fn find_team_by_id(&self, id: &TeamId) -> Result<Team, TeamStoreError> {
        match self.teams.get(id) {
            Some(team) => Ok(self.with_members(team)),
            None => Err(TeamStoreError::TeamIDNotFound),
        }
    }

    async fn count_teams(&self) -> Result<u64, TeamStoreError> {
        Ok(self.teams.len() as u64)
    }
}
