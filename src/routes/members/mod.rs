mod find_member;
mod find_member2;
mod list_members;

pub use find_member::find_member;
pub use find_member2::{find_member2, LoadedMember};
pub use list_members::{list_members, ListMembersParams};
