//! 有效权限解析器
//!
//! 只读路径：直接授予的权限名 ∪ 经由角色成员关系获得的权限名，去重后按序号 (ordinal) 升序返回。
//! 每次调用都读取当时的关联数据，不提供跨调用的快照一致性。

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use cuba_common::{TenantId, UserId};
use cuba_errors::AppResult;
use metrics::histogram;
use tracing::debug;

use crate::domain::identity::IdentityStore;
use crate::domain::permission::{RolePermissionRepository, UserPermissionRepository};

pub struct PermissionResolver {
    user_permissions: Arc<dyn UserPermissionRepository>,
    role_permissions: Arc<dyn RolePermissionRepository>,
    identity: Arc<dyn IdentityStore>,
}

impl PermissionResolver {
    pub fn new(
        user_permissions: Arc<dyn UserPermissionRepository>,
        role_permissions: Arc<dyn RolePermissionRepository>,
        identity: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            user_permissions,
            role_permissions,
            identity,
        }
    }

    /// 计算用户的有效权限名
    ///
    /// `tenant_id` 预留给将来的分区，目前不参与计算。
    pub async fn resolve(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> AppResult<Vec<String>> {
        let start = Instant::now();

        let (direct, via_roles) = tokio::try_join!(
            self.user_permissions.permission_names(user_id),
            self.role_derived_names(user_id),
        )?;

        let names: BTreeSet<String> = direct.into_iter().chain(via_roles).collect();

        histogram!("permission_resolution_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);
        debug!(
            %user_id,
            tenant_id = ?tenant_id.map(|t| t.to_string()),
            count = names.len(),
            "Resolved effective permissions"
        );

        Ok(names.into_iter().collect())
    }

    /// 用户 → 角色成员关系 → 角色权限 → 权限名
    async fn role_derived_names(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        let role_ids = self.identity.user_role_ids(user_id).await?;
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.role_permissions
            .permission_names_for_roles(&role_ids)
            .await
    }
}
