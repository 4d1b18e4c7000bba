//! 应用层

pub mod authorization;
pub mod permission;
