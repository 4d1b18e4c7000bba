//! 权限组管理器

use std::sync::Arc;

use cuba_errors::AppError;
use tracing::{info, warn};

use crate::domain::permission::{
    Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository,
    PermissionRepository,
};
use crate::error::{PermissionError, PermissionResult};

pub struct PermissionGroupManager {
    groups: Arc<dyn PermissionGroupRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl PermissionGroupManager {
    pub fn new(
        groups: Arc<dyn PermissionGroupRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            groups,
            permissions,
        }
    }

    /// 创建权限组
    pub async fn create(&self, mut group: PermissionGroup) -> PermissionResult<PermissionGroup> {
        group.name = validated_name(&group.name)?;

        if self.groups.exists_by_name(&group.name, None).await? {
            return Err(PermissionError::DuplicateGroupName(group.name));
        }

        match self.groups.create(&group).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => return Err(PermissionError::DuplicateGroupName(group.name)),
            Err(e) => return Err(e.into()),
        }

        info!(group_id = %group.id, name = %group.name, "Permission group created");
        Ok(group)
    }

    /// 更新权限组
    pub async fn update(&self, mut group: PermissionGroup) -> PermissionResult<PermissionGroup> {
        group.name = validated_name(&group.name)?;

        if self.groups.exists_by_name(&group.name, Some(&group.id)).await? {
            return Err(PermissionError::DuplicateGroupName(group.name));
        }

        group.audit.touch();

        match self.groups.update(&group).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => return Err(PermissionError::DuplicateGroupName(group.name)),
            Err(AppError::NotFound(_)) => return Err(PermissionError::PermissionGroupNotFound),
            Err(e) => return Err(e.into()),
        }

        info!(group_id = %group.id, name = %group.name, "Permission group updated");
        Ok(group)
    }

    /// 删除权限组
    ///
    /// 组内仍有权限时拒绝删除，权限不会被级联删除。
    pub async fn delete(&self, group: &PermissionGroup) -> PermissionResult<()> {
        let in_use = self.permissions.count_by_group(&group.id).await?;
        if in_use > 0 {
            warn!(group_id = %group.id, permissions = in_use, "Refused to delete non-empty permission group");
            return Err(PermissionError::GroupInUse(group.name.clone()));
        }

        match self.groups.delete(group).await {
            Ok(()) => {}
            // 检查之后并发加入了权限
            Err(AppError::Conflict(_)) => return Err(PermissionError::GroupInUse(group.name.clone())),
            Err(e) => return Err(e.into()),
        }

        info!(group_id = %group.id, name = %group.name, "Permission group deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: &PermissionGroupId) -> PermissionResult<Option<PermissionGroup>> {
        Ok(self.groups.find_by_id(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> PermissionResult<Option<PermissionGroup>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self.groups.find_by_name(name).await?)
    }

    /// 按排序提示、名称升序列出
    pub async fn get_all(&self) -> PermissionResult<Vec<PermissionGroup>> {
        Ok(self.groups.list_all().await?)
    }

    /// 组内权限，按名称升序
    pub async fn get_group_permissions(
        &self,
        group_id: &PermissionGroupId,
    ) -> PermissionResult<Vec<Permission>> {
        if self.groups.find_by_id(group_id).await?.is_none() {
            return Err(PermissionError::PermissionGroupNotFound);
        }
        Ok(self.permissions.list_by_group(group_id).await?)
    }
}

fn validated_name(name: &str) -> PermissionResult<String> {
    let name = name.trim();
    if name.is_empty() {
        warn!("Rejected permission group with empty name");
        return Err(PermissionError::InvalidGroupName);
    }
    Ok(name.to_string())
}
