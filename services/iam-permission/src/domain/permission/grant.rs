//! 授权关联 (角色-权限、用户-权限)

use cuba_common::{RoleId, UserId};
use serde::{Deserialize, Serialize};

use super::permission::PermissionId;

/// 角色授予权限：角色的每个成员都获得该权限
///
/// 以 (role_id, permission_id) 为复合主键，同一对最多出现一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

impl RolePermission {
    pub fn new(role_id: RoleId, permission_id: PermissionId) -> Self {
        Self {
            role_id,
            permission_id,
        }
    }
}

/// 直接授予用户的权限，与角色成员关系无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPermission {
    pub user_id: UserId,
    pub permission_id: PermissionId,
}

impl UserPermission {
    pub fn new(user_id: UserId, permission_id: PermissionId) -> Self {
        Self {
            user_id,
            permission_id,
        }
    }
}
