//! IAM Permission - 基于权限的访问控制
//!
//! 在已有的用户/角色身份体系之上提供权限分配、有效权限解析与授权策略评估

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{PermissionError, PermissionResult};
