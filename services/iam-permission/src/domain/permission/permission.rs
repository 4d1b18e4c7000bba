//! 权限实体

use cuba_common::{AuditInfo, uuid_id};
use serde::{Deserialize, Serialize};

use super::group::PermissionGroupId;
use super::normalizer::{LookupNormalizer, UpperInvariantNormalizer};

uuid_id!(
    /// 权限 ID
    PermissionId
);

/// 权限实体
///
/// 权限是一个具名能力，例如 `orders.read`。名称唯一性按规范化后的名称比较，
/// 规范化结果保存在 `normalized_name` 中供存储层建立唯一索引。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub normalized_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub group_id: Option<PermissionGroupId>,
    pub audit: AuditInfo,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = UpperInvariantNormalizer.normalize(&name);
        Self {
            id: PermissionId::new(),
            name,
            normalized_name,
            display_name: None,
            description: None,
            group_id: None,
            audit: AuditInfo::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_group(mut self, group_id: PermissionGroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// 修剪名称并按给定规范化器重新计算规范化名称
    pub fn normalize_name(&mut self, normalizer: &dyn LookupNormalizer) {
        self.name = self.name.trim().to_string();
        self.normalized_name = normalizer.normalize(&self.name);
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.is_deleted
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Permission {}
