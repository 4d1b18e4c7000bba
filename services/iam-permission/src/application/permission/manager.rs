//! 权限管理器
//!
//! 权限的增删改查，以及向角色/用户授予和撤销权限。

use std::collections::HashMap;
use std::sync::Arc;

use cuba_common::{RoleId, UserId};
use cuba_errors::AppError;
use tracing::{debug, info, warn};

use crate::domain::identity::IdentityStore;
use crate::domain::permission::{
    LookupNormalizer, Permission, PermissionId, PermissionStores, RolePermission,
    UpperInvariantNormalizer, UserPermission,
};
use crate::error::{PermissionError, PermissionResult};

/// 权限管理器
///
/// 应用层的存在性检查只用于减少常见情况下的往返并给出友好错误；
/// 并发下的唯一性由存储层约束裁决，冲突被转换为 `DuplicateName` 或视为已授予。
pub struct PermissionManager {
    stores: PermissionStores,
    identity: Arc<dyn IdentityStore>,
    normalizer: Arc<dyn LookupNormalizer>,
}

impl PermissionManager {
    pub fn new(stores: PermissionStores, identity: Arc<dyn IdentityStore>) -> Self {
        Self {
            stores,
            identity,
            normalizer: Arc::new(UpperInvariantNormalizer),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn LookupNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalize(&self, name: &str) -> String {
        if name.trim().is_empty() {
            return String::new();
        }
        self.normalizer.normalize(name)
    }

    /// 创建权限
    pub async fn create(&self, mut permission: Permission) -> PermissionResult<Permission> {
        if permission.name.trim().is_empty() {
            warn!("Rejected permission with empty name");
            return Err(PermissionError::InvalidPermissionName);
        }

        permission.normalize_name(self.normalizer.as_ref());
        self.ensure_group_exists(&permission).await?;

        if self
            .stores
            .permissions
            .exists_by_normalized_name(&permission.normalized_name, None)
            .await?
        {
            return Err(PermissionError::DuplicateName(permission.name));
        }

        match self.stores.permissions.create(&permission).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                return Err(PermissionError::DuplicateName(permission.name));
            }
            // 检查之后权限组被并发删除
            Err(AppError::Validation(_)) if permission.group_id.is_some() => {
                return Err(PermissionError::PermissionGroupNotFound);
            }
            Err(e) => return Err(e.into()),
        }

        info!(permission_id = %permission.id, name = %permission.name, "Permission created");
        Ok(permission)
    }

    /// 更新权限，重名检查排除自身
    pub async fn update(&self, mut permission: Permission) -> PermissionResult<Permission> {
        if permission.name.trim().is_empty() {
            warn!(permission_id = %permission.id, "Rejected permission update with empty name");
            return Err(PermissionError::InvalidPermissionName);
        }

        permission.normalize_name(self.normalizer.as_ref());
        self.ensure_group_exists(&permission).await?;

        if self
            .stores
            .permissions
            .exists_by_normalized_name(&permission.normalized_name, Some(&permission.id))
            .await?
        {
            return Err(PermissionError::DuplicateName(permission.name));
        }

        permission.audit.touch();

        match self.stores.permissions.update(&permission).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                return Err(PermissionError::DuplicateName(permission.name));
            }
            Err(AppError::Validation(_)) if permission.group_id.is_some() => {
                return Err(PermissionError::PermissionGroupNotFound);
            }
            Err(AppError::NotFound(_)) => return Err(PermissionError::PermissionNotFound),
            Err(e) => return Err(e.into()),
        }

        info!(permission_id = %permission.id, name = %permission.name, "Permission updated");
        Ok(permission)
    }

    /// 删除权限
    ///
    /// 逻辑删除，同时移除该权限的全部角色/用户授权。
    pub async fn delete(&self, permission: &Permission) -> PermissionResult<()> {
        self.stores.permissions.delete(permission).await?;
        info!(permission_id = %permission.id, name = %permission.name, "Permission deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: &PermissionId) -> PermissionResult<Option<Permission>> {
        Ok(self.stores.permissions.find_by_id(id).await?)
    }

    /// 按名称查找，名称比较前先规范化
    pub async fn find_by_name(&self, name: &str) -> PermissionResult<Option<Permission>> {
        let normalized = self.normalize(name);
        if normalized.is_empty() {
            return Ok(None);
        }
        Ok(self
            .stores
            .permissions
            .find_by_normalized_name(&normalized)
            .await?)
    }

    /// 全部未删除权限，按名称升序
    pub async fn get_all(&self) -> PermissionResult<Vec<Permission>> {
        Ok(self.stores.permissions.list_all().await?)
    }

    /// 将权限授予角色 (幂等)
    pub async fn add_to_role(
        &self,
        permission_id: &PermissionId,
        role_id: &RoleId,
    ) -> PermissionResult<()> {
        if !self.identity.role_exists(role_id).await? {
            return Err(PermissionError::RoleNotFound);
        }
        if !self.stores.permissions.exists(permission_id).await? {
            return Err(PermissionError::PermissionNotFound);
        }

        let grant = RolePermission::new(*role_id, *permission_id);
        if self.stores.role_permissions.exists(&grant).await? {
            debug!(%role_id, %permission_id, "Role already has permission");
            return Ok(());
        }

        match self.stores.role_permissions.add(&grant).await {
            Ok(true) => info!(%role_id, %permission_id, "Permission granted to role"),
            Ok(false) => {
                debug!(%role_id, %permission_id, "Concurrent grant to role already applied")
            }
            // 检查之后权限被并发删除
            Err(AppError::NotFound(_)) => return Err(PermissionError::PermissionNotFound),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// 撤销角色的权限，授权不存在也视为成功
    pub async fn remove_from_role(
        &self,
        permission_id: &PermissionId,
        role_id: &RoleId,
    ) -> PermissionResult<()> {
        let grant = RolePermission::new(*role_id, *permission_id);
        if self.stores.role_permissions.remove(&grant).await? {
            info!(%role_id, %permission_id, "Permission revoked from role");
        }
        Ok(())
    }

    /// 角色的直接权限，按名称升序
    pub async fn get_role_permissions(&self, role_id: &RoleId) -> PermissionResult<Vec<Permission>> {
        Ok(self.stores.role_permissions.list_permissions(role_id).await?)
    }

    /// 将权限直接授予用户 (幂等)
    pub async fn add_to_user(
        &self,
        permission_id: &PermissionId,
        user_id: &UserId,
    ) -> PermissionResult<()> {
        if !self.identity.user_exists(user_id).await? {
            return Err(PermissionError::UserNotFound);
        }
        if !self.stores.permissions.exists(permission_id).await? {
            return Err(PermissionError::PermissionNotFound);
        }

        let grant = UserPermission::new(*user_id, *permission_id);
        if self.stores.user_permissions.exists(&grant).await? {
            debug!(%user_id, %permission_id, "User already has permission");
            return Ok(());
        }

        match self.stores.user_permissions.add(&grant).await {
            Ok(true) => info!(%user_id, %permission_id, "Permission granted to user"),
            Ok(false) => {
                debug!(%user_id, %permission_id, "Concurrent grant to user already applied")
            }
            // 检查之后权限被并发删除
            Err(AppError::NotFound(_)) => return Err(PermissionError::PermissionNotFound),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// 撤销用户的直接权限，授权不存在也视为成功
    pub async fn remove_from_user(
        &self,
        permission_id: &PermissionId,
        user_id: &UserId,
    ) -> PermissionResult<()> {
        let grant = UserPermission::new(*user_id, *permission_id);
        if self.stores.user_permissions.remove(&grant).await? {
            info!(%user_id, %permission_id, "Permission revoked from user");
        }
        Ok(())
    }

    /// 用户的有效权限：直接授予 ∪ 经由角色获得，去重后按名称升序
    pub async fn get_user_permissions(&self, user_id: &UserId) -> PermissionResult<Vec<Permission>> {
        let direct = self.stores.user_permissions.list_permissions(user_id).await?;

        let role_ids = self.identity.user_role_ids(user_id).await?;
        let via_roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            self.stores
                .role_permissions
                .list_permissions_for_roles(&role_ids)
                .await?
        };

        let mut merged: HashMap<PermissionId, Permission> = HashMap::new();
        for permission in direct.into_iter().chain(via_roles) {
            merged.entry(permission.id).or_insert(permission);
        }

        let mut permissions: Vec<Permission> = merged.into_values().collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(permissions)
    }

    /// 用户是否拥有某权限 (规范化名称比较)
    pub async fn user_has(&self, user_id: &UserId, permission_name: &str) -> PermissionResult<bool> {
        let normalized = self.normalize(permission_name);
        if normalized.is_empty() {
            return Ok(false);
        }

        let permissions = self.get_user_permissions(user_id).await?;
        Ok(permissions
            .iter()
            .any(|p| self.normalizer.normalize(&p.name) == normalized))
    }

    async fn ensure_group_exists(&self, permission: &Permission) -> PermissionResult<()> {
        if let Some(group_id) = &permission.group_id {
            if self.stores.groups.find_by_id(group_id).await?.is_none() {
                return Err(PermissionError::PermissionGroupNotFound);
            }
        }
        Ok(())
    }
}
