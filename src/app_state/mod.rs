use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{MemberStore, TeamStore};

pub type MemberStoreType = Arc<RwLock<dyn MemberStore + Send + Sync>>;
pub type TeamStoreType = Arc<RwLock<dyn TeamStore + Send + Sync>>;

#[derive(Clone)]
pub struct AppState {
    pub member_store: MemberStoreType,
    pub team_store: TeamStoreType,
}

impl AppState {
    pub fn new(member_store: MemberStoreType, team_store: TeamStoreType) -> Self {
        Self {
            member_store,
            team_store,
        }
    }
}
