use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use color_eyre::eyre::eyre;

use crate::{
    domain::{Member, MemberAPIError, MemberId, MemberStoreError, ValidationError},
    AppState,
};

/// A member loaded from the `:id` path segment before the handler runs.
pub struct LoadedMember(pub Member);

#[async_trait]
impl FromRequestParts<AppState> for LoadedMember {
    type Rejection = MemberAPIError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ValidationError::new(e.body_text()))?;
        let member_id = MemberId::parse(&id)?;

        state
            .member_store
            .read()
            .await
            .find_by_id(&member_id)
            .await
            .map(LoadedMember)
            .map_err(|e| match e {
                MemberStoreError::MemberIDNotFound => {
                    MemberAPIError::IDNotFoundError(*member_id.as_ref())
                }
                e => MemberAPIError::UnexpectedError(eyre!(e)),
            })
    }
}

#[tracing::instrument(name = "Find member by converter route handler", skip_all)]
pub async fn find_member2(
    LoadedMember(member): LoadedMember,
) -> (StatusCode, String) {
    tracing::debug!("member_id: {}", member.id());
    (StatusCode::OK, member.user_name.as_ref().to_owned())
}
