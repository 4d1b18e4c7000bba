//! 权限组实体

use cuba_common::{AuditInfo, uuid_id};
use serde::{Deserialize, Serialize};

uuid_id!(
    /// 权限组 ID
    PermissionGroupId
);

/// 权限组
///
/// 组只用于归类展示。删除组不会级联删除组内权限，组内仍有权限时删除被拒绝。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: PermissionGroupId,
    pub name: String,
    pub display_name: Option<String>,
    /// 排序提示
    pub order: i32,
    pub audit: AuditInfo,
}

impl PermissionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PermissionGroupId::new(),
            name: name.into(),
            display_name: None,
            order: 0,
            audit: AuditInfo::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl PartialEq for PermissionGroup {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PermissionGroup {}
