//! 权限目录同步
//!
//! 启动时把配置中声明的权限组与权限写入存储。已存在的名称保持原样，缺失的被创建，可重复执行。

use std::sync::Arc;

use cuba_config::{CatalogConfig, PermissionSeed};
use tracing::info;

use super::group_manager::PermissionGroupManager;
use super::manager::PermissionManager;
use crate::domain::permission::{Permission, PermissionGroup, PermissionGroupId};
use crate::error::{PermissionError, PermissionResult};

/// 同步结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub groups_created: usize,
    pub permissions_created: usize,
    pub permissions_existing: usize,
}

pub struct PermissionSeeder {
    permissions: Arc<PermissionManager>,
    groups: Arc<PermissionGroupManager>,
}

impl PermissionSeeder {
    pub fn new(permissions: Arc<PermissionManager>, groups: Arc<PermissionGroupManager>) -> Self {
        Self {
            permissions,
            groups,
        }
    }

    pub async fn seed(&self, catalog: &CatalogConfig) -> PermissionResult<SeedReport> {
        let mut report = SeedReport::default();

        for group_seed in &catalog.groups {
            let group_id = match self.groups.find_by_name(&group_seed.name).await? {
                Some(group) => group.id,
                None => {
                    let mut group = PermissionGroup::new(&group_seed.name).with_order(group_seed.order);
                    group.display_name = group_seed.display_name.clone();
                    match self.groups.create(group).await {
                        Ok(group) => {
                            report.groups_created += 1;
                            group.id
                        }
                        // 并发同步抢先创建
                        Err(PermissionError::DuplicateGroupName(_)) => self
                            .groups
                            .find_by_name(&group_seed.name)
                            .await?
                            .map(|g| g.id)
                            .ok_or(PermissionError::PermissionGroupNotFound)?,
                        Err(e) => return Err(e),
                    }
                }
            };

            for seed in &group_seed.permissions {
                self.seed_permission(seed, Some(group_id), &mut report).await?;
            }
        }

        for seed in &catalog.permissions {
            self.seed_permission(seed, None, &mut report).await?;
        }

        info!(
            groups_created = report.groups_created,
            permissions_created = report.permissions_created,
            permissions_existing = report.permissions_existing,
            "Permission catalog seeded"
        );
        Ok(report)
    }

    async fn seed_permission(
        &self,
        seed: &PermissionSeed,
        group_id: Option<PermissionGroupId>,
        report: &mut SeedReport,
    ) -> PermissionResult<()> {
        if self.permissions.find_by_name(&seed.name).await?.is_some() {
            report.permissions_existing += 1;
            return Ok(());
        }

        let mut permission = Permission::new(&seed.name);
        permission.display_name = seed.display_name.clone();
        permission.description = seed.description.clone();
        permission.group_id = group_id;

        match self.permissions.create(permission).await {
            Ok(_) => report.permissions_created += 1,
            Err(PermissionError::DuplicateName(_)) => report.permissions_existing += 1,
            Err(e) => return Err(e),
        }
        Ok(())
    }
}
