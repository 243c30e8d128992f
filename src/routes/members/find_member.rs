use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use color_eyre::eyre::eyre;

use crate::{
    domain::{MemberAPIError, MemberId, MemberStoreError},
    AppState,
};

#[tracing::instrument(name = "Find member route handler", skip_all)]
pub async fn find_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, String), MemberAPIError> {
    let member_id = MemberId::parse(&id)?;
    tracing::debug!("member_id: {}", member_id);

    let member = state
        .member_store
        .read()
        .await
        .find_by_id(&member_id)
        .await
        .map_err(|e| match e {
            MemberStoreError::MemberIDNotFound => {
                MemberAPIError::IDNotFoundError(*member_id.as_ref())
            }
            e => MemberAPIError::UnexpectedError(eyre!(e)),
        })?;

    Ok((StatusCode::OK, member.user_name.as_ref().to_owned()))
}
