//! 权限仓储接口
//!
//! 所有查询只返回未删除的行。唯一性最终由存储层约束保证：插入冲突返回 `AppError::Conflict`。

use std::sync::Arc;

use async_trait::async_trait;
use cuba_common::{RoleId, UserId};
use cuba_errors::AppResult;

use super::grant::{RolePermission, UserPermission};
use super::group::{PermissionGroup, PermissionGroupId};
use super::permission::{Permission, PermissionId};

/// 权限仓储接口
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// 创建权限，规范化名称冲突时返回 Conflict，引用的权限组不存在或已删除时返回 Validation
    async fn create(&self, permission: &Permission) -> AppResult<()>;

    /// 更新权限，错误约定同 `create`；权限不存在时返回 NotFound
    async fn update(&self, permission: &Permission) -> AppResult<()>;

    /// 逻辑删除权限，并在同一事务内移除它的全部授权关联
    async fn delete(&self, permission: &Permission) -> AppResult<()>;

    /// 根据 ID 查找权限
    async fn find_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>>;

    /// 根据规范化名称查找权限
    async fn find_by_normalized_name(&self, normalized_name: &str) -> AppResult<Option<Permission>>;

    /// 检查规范化名称是否已被占用，`exclude` 用于更新时排除自身
    async fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
        exclude: Option<&PermissionId>,
    ) -> AppResult<bool>;

    /// 检查权限是否存在
    async fn exists(&self, id: &PermissionId) -> AppResult<bool>;

    /// 列出所有权限 (按名称升序)
    async fn list_all(&self) -> AppResult<Vec<Permission>>;

    /// 列出组内权限 (按名称升序)
    async fn list_by_group(&self, group_id: &PermissionGroupId) -> AppResult<Vec<Permission>>;

    /// 统计组内权限数量
    async fn count_by_group(&self, group_id: &PermissionGroupId) -> AppResult<u64>;
}

/// 权限组仓储接口
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    async fn create(&self, group: &PermissionGroup) -> AppResult<()>;

    async fn update(&self, group: &PermissionGroup) -> AppResult<()>;

    /// 逻辑删除；组内仍有未删除的权限时返回 Conflict
    async fn delete(&self, group: &PermissionGroup) -> AppResult<()>;

    async fn find_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionGroup>>;

    async fn exists_by_name(
        &self,
        name: &str,
        exclude: Option<&PermissionGroupId>,
    ) -> AppResult<bool>;

    /// 按排序提示、名称升序列出
    async fn list_all(&self) -> AppResult<Vec<PermissionGroup>>;
}

/// 角色权限关联仓储接口
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// 添加授权；已存在时返回 `false` 且不产生重复行，权限不存在或已删除时返回 NotFound
    async fn add(&self, grant: &RolePermission) -> AppResult<bool>;

    /// 移除授权；不存在时返回 `false`
    async fn remove(&self, grant: &RolePermission) -> AppResult<bool>;

    async fn exists(&self, grant: &RolePermission) -> AppResult<bool>;

    /// 获取角色的直接权限 (按名称升序)
    async fn list_permissions(&self, role_id: &RoleId) -> AppResult<Vec<Permission>>;

    /// 获取多个角色授予的权限，可能包含重复
    async fn list_permissions_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Permission>>;

    /// 多个角色授予的权限名，可能包含重复
    async fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<String>>;
}

/// 用户权限关联仓储接口
#[async_trait]
pub trait UserPermissionRepository: Send + Sync {
    /// 添加授权；已存在时返回 `false` 且不产生重复行，权限不存在或已删除时返回 NotFound
    async fn add(&self, grant: &UserPermission) -> AppResult<bool>;

    /// 移除授权；不存在时返回 `false`
    async fn remove(&self, grant: &UserPermission) -> AppResult<bool>;

    async fn exists(&self, grant: &UserPermission) -> AppResult<bool>;

    /// 获取直接授予用户的权限
    async fn list_permissions(&self, user_id: &UserId) -> AppResult<Vec<Permission>>;

    /// 直接授予用户的权限名
    async fn permission_names(&self, user_id: &UserId) -> AppResult<Vec<String>>;
}

/// 权限存储的全部仓储
#[derive(Clone)]
pub struct PermissionStores {
    pub permissions: Arc<dyn PermissionRepository>,
    pub groups: Arc<dyn PermissionGroupRepository>,
    pub role_permissions: Arc<dyn RolePermissionRepository>,
    pub user_permissions: Arc<dyn UserPermissionRepository>,
}

impl PermissionStores {
    /// 由同时实现全部仓储接口的存储构造
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: PermissionRepository
            + PermissionGroupRepository
            + RolePermissionRepository
            + UserPermissionRepository
            + 'static,
    {
        Self {
            permissions: store.clone(),
            groups: store.clone(),
            role_permissions: store.clone(),
            user_permissions: store,
        }
    }
}
