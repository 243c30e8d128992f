mod find_member;
mod list_members;
