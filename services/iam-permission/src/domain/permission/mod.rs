//! 权限领域模块

#![allow(clippy::module_inception)]

pub mod grant;
pub mod group;
pub mod normalizer;
pub mod permission;
pub mod repository;

pub use grant::{RolePermission, UserPermission};
pub use group::{PermissionGroup, PermissionGroupId};
pub use normalizer::{LookupNormalizer, UpperInvariantNormalizer};
pub use permission::{Permission, PermissionId};
pub use repository::{
    PermissionGroupRepository, PermissionRepository, PermissionStores, RolePermissionRepository,
    UserPermissionRepository,
};
