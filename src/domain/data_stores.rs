use super::{
    Member, MemberDto, MemberId, MemberProjection, MemberSpec, MemberWithTeam, NewMember,
    NewTeam, Page, PageRequest, Slice, Team, TeamId, UserName,
};
use color_eyre::eyre::Report;
use thiserror::Error;

#[async_trait::async_trait]
pub trait MemberStore {
    async fn save(&mut self, member: NewMember)
        -> Result<Member, MemberStoreError>;
    async fn update(&mut self, member: &Member)
        -> Result<Member, MemberStoreError>;
    async fn delete(&mut self, id: &MemberId) -> Result<(), MemberStoreError>;
    async fn find_by_id(&self, id: &MemberId)
        -> Result<Member, MemberStoreError>;
    async fn find_all(&self) -> Result<Vec<Member>, MemberStoreError>;
    async fn count(&self) -> Result<u64, MemberStoreError>;

    async fn find_by_user_name_and_age_greater_than(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_top(
        &self,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_user(
        &self,
        user_name: &UserName,
        age: i32,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_user_name_list(
        &self,
    ) -> Result<Vec<UserName>, MemberStoreError>;
    async fn find_member_dto(&self) -> Result<Vec<MemberDto>, MemberStoreError>;
    async fn find_by_names(
        &self,
        names: &[UserName],
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_optional_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Option<Member>, MemberStoreError>;
    async fn find_member_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError>;

    async fn find_page(
        &self,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError>;
    async fn find_paging_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Page<Member>, MemberStoreError>;
    async fn find_slice_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> Result<Slice<Member>, MemberStoreError>;
    async fn find_by_page(
        &self,
        age: i32,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn total_count(&self, age: i32) -> Result<u64, MemberStoreError>;

    async fn bulk_age_plus(&mut self, age: i32)
        -> Result<u64, MemberStoreError>;

    async fn find_member_fetch_join(
        &self,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError>;
    async fn find_entity_graph_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError>;
    async fn find_read_only_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Member, MemberStoreError>;
    async fn find_lock_by_user_name(
        &mut self,
        user_name: &UserName,
    ) -> Result<Vec<Member>, MemberStoreError>;
    async fn find_projections_by_user_name(
        &self,
        user_name: &UserName,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError>;
    async fn find_by_native_projection(
        &self,
        request: &PageRequest,
    ) -> Result<Page<MemberProjection>, MemberStoreError>;
    async fn find_all_matching(
        &self,
        spec: &MemberSpec,
    ) -> Result<Vec<MemberWithTeam>, MemberStoreError>;
}

#[derive(Debug, Error)]
pub enum MemberStoreError {
    #[error("Member ID not found")]
    MemberIDNotFound,
    #[error("Member not found")]
    MemberNotFound,
    #[error("Team ID not found")]
    TeamIDNotFound,
    #[error("Query returned more than one result")]
    NonUniqueResult,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for MemberStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::MemberIDNotFound, Self::MemberIDNotFound)
                | (Self::MemberNotFound, Self::MemberNotFound)
                | (Self::TeamIDNotFound, Self::TeamIDNotFound)
                | (Self::NonUniqueResult, Self::NonUniqueResult)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait::async_trait]
pub trait TeamStore {
    async fn save_team(&mut self, team: NewTeam)
        -> Result<Team, TeamStoreError>;
    async fn delete_team(&mut self, id: &TeamId) -> Result<(), TeamStoreError>;
    async fn find_all_teams(&self) -> Result<Vec<Team>, TeamStoreError>;
    async fn find_team_by_id(&self, id: &TeamId)
        -> Result<Team, TeamStoreError>;
    async fn count_teams(&self) -> Result<u64, TeamStoreError>;
}

#[derive(Debug, Error)]
pub enum TeamStoreError {
    #[error("Team ID not found")]
    TeamIDNotFound,
    #[error("Team still has members")]
    TeamHasMembers,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for TeamStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::TeamIDNotFound, Self::TeamIDNotFound)
                | (Self::TeamHasMembers, Self::TeamHasMembers)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}
