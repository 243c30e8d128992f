use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use color_eyre::eyre::eyre;
use serde::Deserialize;

use crate::{
    domain::{
        MemberAPIError, MemberDto, Page, PageRequest, Sort, ValidationError,
    },
    utils::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListMembersParams {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort: Option<String>,
}

impl ListMembersParams {
    pub fn page_request(&self) -> Result<PageRequest, MemberAPIError> {
        let size = match self.size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        };
        let sort = self
            .sort
            .as_deref()
            .map(Sort::parse)
            .transpose()?
            .unwrap_or_default();

        Ok(PageRequest::sorted(self.page.unwrap_or(0), size, sort)?)
    }
}

#[tracing::instrument(name = "List members route handler", skip_all)]
pub async fn list_members(
    State(state): State<AppState>,
    params: Result<Query<ListMembersParams>, QueryRejection>,
) -> Result<(StatusCode, Json<Page<MemberDto>>), MemberAPIError> {
    let Query(params) =
        params.map_err(|e| ValidationError::new(e.body_text()))?;
    let request = params.page_request()?;
    tracing::debug!(
        "page: {}, size: {}",
        request.page(),
        request.size()
    );

    let page = state
        .member_store
        .read()
        .await
        .find_page(&request)
        .await
        .map_err(|e| MemberAPIError::UnexpectedError(eyre!(e)))?;

    let response = page.map(|member| MemberDto::new(&member, None));
    Ok((StatusCode::OK, Json(response)))
}
