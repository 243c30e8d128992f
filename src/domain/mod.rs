mod audit;
mod data_stores;
mod dto;
mod error;
mod member;
mod member_id;
mod paging;
mod specification;
mod team;
mod team_id;
mod team_name;
mod user_name;

pub use audit::*;
pub use data_stores::*;
pub use dto::*;
pub use error::*;
pub use member::*;
pub use member_id::*;
pub use paging::*;
pub use specification::*;
pub use team::*;
pub use team_id::*;
pub use team_name::*;
pub use user_name::*;
