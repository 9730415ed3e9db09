//! Repository list handling and checkout management

pub mod fetch;
pub mod list;
