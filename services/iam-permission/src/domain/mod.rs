//! 领域层

pub mod identity;
pub mod permission;
