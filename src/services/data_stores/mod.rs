mod hashmap_member_store;
mod postgres_member_store;
mod postgres_team_store;

pub use hashmap_member_store::*;
pub use postgres_member_store::*;
pub use postgres_team_store::*;
