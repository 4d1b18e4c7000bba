use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use cuba_common::{RoleId, UserId};
use cuba_errors::{AppError, AppResult};

use super::lock;
use crate::domain::permission::{
    Permission, PermissionGroup, PermissionGroupId, PermissionGroupRepository, PermissionId,
    PermissionRepository, RolePermission, RolePermissionRepository, UserPermission,
    UserPermissionRepository,
};

#[derive(Debug, Default)]
struct StoreState {
    permissions: HashMap<PermissionId, Permission>,
    groups: HashMap<PermissionGroupId, PermissionGroup>,
    role_permissions: HashSet<RolePermission>,
    user_permissions: HashSet<UserPermission>,
}

impl StoreState {
    fn live_permission(&self, id: &PermissionId) -> Option<&Permission> {
        self.permissions.get(id).filter(|p| !p.is_deleted())
    }

    fn live_group(&self, id: &PermissionGroupId) -> Option<&PermissionGroup> {
        self.groups.get(id).filter(|g| !g.audit.is_deleted)
    }

    fn name_taken(&self, normalized_name: &str, exclude: Option<&PermissionId>) -> bool {
        self.permissions.values().any(|p| {
            !p.is_deleted() && p.normalized_name == normalized_name && Some(&p.id) != exclude
        })
    }

    fn group_name_taken(&self, name: &str, exclude: Option<&PermissionGroupId>) -> bool {
        self.groups
            .values()
            .any(|g| !g.audit.is_deleted && g.name == name && Some(&g.id) != exclude)
    }

    fn check_group_reference(&self, permission: &Permission) -> AppResult<()> {
        match &permission.group_id {
            Some(group_id) if self.live_group(group_id).is_none() => {
                Err(AppError::validation("Permission group not found"))
            }
            _ => Ok(()),
        }
    }

    fn sorted_live<'a>(&self, ids: impl Iterator<Item = &'a PermissionId>) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = ids
            .filter_map(|id| self.live_permission(id).cloned())
            .collect();
        sort_by_name(&mut permissions);
        permissions
    }
}

fn sort_by_name(permissions: &mut [Permission]) {
    permissions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

/// 进程内权限存储，实现全部权限仓储接口
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    state: Mutex<StoreState>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 角色-权限关联行数
    pub fn role_grant_count(&self) -> AppResult<usize> {
        Ok(lock(&self.state)?.role_permissions.len())
    }

    /// 用户-权限关联行数
    pub fn user_grant_count(&self) -> AppResult<usize> {
        Ok(lock(&self.state)?.user_permissions.len())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionStore {
    async fn create(&self, permission: &Permission) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if state.permissions.contains_key(&permission.id)
            || state.name_taken(&permission.normalized_name, None)
        {
            return Err(AppError::conflict("Duplicate entry violates unique constraint"));
        }
        state.check_group_reference(permission)?;
        state.permissions.insert(permission.id, permission.clone());
        Ok(())
    }

    async fn update(&self, permission: &Permission) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if state.live_permission(&permission.id).is_none() {
            return Err(AppError::not_found("Permission not found"));
        }
        if state.name_taken(&permission.normalized_name, Some(&permission.id)) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint"));
        }
        state.check_group_reference(permission)?;
        state.permissions.insert(permission.id, permission.clone());
        Ok(())
    }

    async fn delete(&self, permission: &Permission) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if let Some(stored) = state.permissions.get_mut(&permission.id) {
            stored.audit.mark_deleted();
        }
        state
            .role_permissions
            .retain(|g| g.permission_id != permission.id);
        state
            .user_permissions
            .retain(|g| g.permission_id != permission.id);
        Ok(())
    }

    async fn find_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        Ok(lock(&self.state)?.live_permission(id).cloned())
    }

    async fn find_by_normalized_name(&self, normalized_name: &str) -> AppResult<Option<Permission>> {
        Ok(lock(&self.state)?
            .permissions
            .values()
            .find(|p| !p.is_deleted() && p.normalized_name == normalized_name)
            .cloned())
    }

    async fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
        exclude: Option<&PermissionId>,
    ) -> AppResult<bool> {
        Ok(lock(&self.state)?.name_taken(normalized_name, exclude))
    }

    async fn exists(&self, id: &PermissionId) -> AppResult<bool> {
        Ok(lock(&self.state)?.live_permission(id).is_some())
    }

    async fn list_all(&self) -> AppResult<Vec<Permission>> {
        let state = lock(&self.state)?;
        Ok(state.sorted_live(state.permissions.keys()))
    }

    async fn list_by_group(&self, group_id: &PermissionGroupId) -> AppResult<Vec<Permission>> {
        let state = lock(&self.state)?;
        Ok(state.sorted_live(
            state
                .permissions
                .values()
                .filter(|p| p.group_id.as_ref() == Some(group_id))
                .map(|p| &p.id),
        ))
    }

    async fn count_by_group(&self, group_id: &PermissionGroupId) -> AppResult<u64> {
        Ok(lock(&self.state)?
            .permissions
            .values()
            .filter(|p| !p.is_deleted() && p.group_id.as_ref() == Some(group_id))
            .count() as u64)
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionStore {
    async fn create(&self, group: &PermissionGroup) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if state.groups.contains_key(&group.id) || state.group_name_taken(&group.name, None) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint"));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn update(&self, group: &PermissionGroup) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if state.live_group(&group.id).is_none() {
            return Err(AppError::not_found("Permission group not found"));
        }
        if state.group_name_taken(&group.name, Some(&group.id)) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint"));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn delete(&self, group: &PermissionGroup) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        let in_use = state
            .permissions
            .values()
            .any(|p| !p.is_deleted() && p.group_id == Some(group.id));
        if in_use {
            return Err(AppError::conflict("Permission group still contains permissions"));
        }
        if let Some(stored) = state.groups.get_mut(&group.id) {
            stored.audit.mark_deleted();
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>> {
        Ok(lock(&self.state)?.live_group(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionGroup>> {
        Ok(lock(&self.state)?
            .groups
            .values()
            .find(|g| !g.audit.is_deleted && g.name == name)
            .cloned())
    }

    async fn exists_by_name(
        &self,
        name: &str,
        exclude: Option<&PermissionGroupId>,
    ) -> AppResult<bool> {
        Ok(lock(&self.state)?.group_name_taken(name, exclude))
    }

    async fn list_all(&self) -> AppResult<Vec<PermissionGroup>> {
        let mut groups: Vec<PermissionGroup> = lock(&self.state)?
            .groups
            .values()
            .filter(|g| !g.audit.is_deleted)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(groups)
    }
}

#[async_trait]
impl RolePermissionRepository for InMemoryPermissionStore {
    async fn add(&self, grant: &RolePermission) -> AppResult<bool> {
        let mut state = lock(&self.state)?;
        if state.live_permission(&grant.permission_id).is_none() {
            return Err(AppError::not_found("Permission not found"));
        }
        Ok(state.role_permissions.insert(*grant))
    }

    async fn remove(&self, grant: &RolePermission) -> AppResult<bool> {
        Ok(lock(&self.state)?.role_permissions.remove(grant))
    }

    async fn exists(&self, grant: &RolePermission) -> AppResult<bool> {
        Ok(lock(&self.state)?.role_permissions.contains(grant))
    }

    async fn list_permissions(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let state = lock(&self.state)?;
        Ok(state.sorted_live(
            state
                .role_permissions
                .iter()
                .filter(|g| &g.role_id == role_id)
                .map(|g| &g.permission_id),
        ))
    }

    async fn list_permissions_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Permission>> {
        let state = lock(&self.state)?;
        Ok(state
            .role_permissions
            .iter()
            .filter(|g| role_ids.contains(&g.role_id))
            .filter_map(|g| state.live_permission(&g.permission_id).cloned())
            .collect())
    }

    async fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<String>> {
        let state = lock(&self.state)?;
        Ok(state
            .role_permissions
            .iter()
            .filter(|g| role_ids.contains(&g.role_id))
            .filter_map(|g| state.live_permission(&g.permission_id).map(|p| p.name.clone()))
            .collect())
    }
}

#[async_trait]
impl UserPermissionRepository for InMemoryPermissionStore {
    async fn add(&self, grant: &UserPermission) -> AppResult<bool> {
        let mut state = lock(&self.state)?;
        if state.live_permission(&grant.permission_id).is_none() {
            return Err(AppError::not_found("Permission not found"));
        }
        Ok(state.user_permissions.insert(*grant))
    }

    async fn remove(&self, grant: &UserPermission) -> AppResult<bool> {
        Ok(lock(&self.state)?.user_permissions.remove(grant))
    }

    async fn exists(&self, grant: &UserPermission) -> AppResult<bool> {
        Ok(lock(&self.state)?.user_permissions.contains(grant))
    }

    async fn list_permissions(&self, user_id: &UserId) -> AppResult<Vec<Permission>> {
        let state = lock(&self.state)?;
        Ok(state.sorted_live(
            state
                .user_permissions
                .iter()
                .filter(|g| &g.user_id == user_id)
                .map(|g| &g.permission_id),
        ))
    }

    async fn permission_names(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        let state = lock(&self.state)?;
        Ok(state
            .user_permissions
            .iter()
            .filter(|g| &g.user_id == user_id)
            .filter_map(|g| state.live_permission(&g.permission_id).map(|p| p.name.clone()))
            .collect())
    }
}
