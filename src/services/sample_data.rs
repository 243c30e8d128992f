use color_eyre::eyre::eyre;

use crate::{
    app_state::MemberStoreType,
    domain::{MemberStoreError, NewMember, UserName},
    utils::constants::SAMPLE_MEMBER_COUNT,
};

/// Fills an empty member table with `user0..user99`, aged by index.
///
/// Returns the number of members written; a table that already holds rows
/// is left alone.
#[tracing::instrument(name = "Seeding sample members", skip_all)]
pub async fn seed_sample_members(
    member_store: &MemberStoreType,
) -> Result<u64, MemberStoreError> {
    let mut store = member_store.write().await;
    if store.count().await? > 0 {
        tracing::info!("member table not empty, skipping sample data");
        return Ok(0);
    }

    let mut seeded = 0;
    for i in 0..SAMPLE_MEMBER_COUNT {
        let user_name = UserName::parse(format!("user{i}"))
            .map_err(|e| MemberStoreError::UnexpectedError(eyre!(e)))?;
        store.save(NewMember::new(user_name, i)).await?;
        seeded += 1;
    }

    tracing::info!("seeded {seeded} sample members");
    Ok(seeded)
}
