//! 基础设施层

pub mod memory;
pub mod persistence;
