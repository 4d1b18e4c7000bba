//! 端点权限门声明

use super::requirement::PERMISSION_POLICY_PREFIX;

/// 由权限名得到策略名 (`perm:<name>`)
pub fn permission_policy_name(permission: &str) -> String {
    format!("{}{}", PERMISSION_POLICY_PREFIX, permission)
}

/// 编译期生成权限策略名
///
/// ```
/// const POLICY: &str = iam_permission::permission_policy!("orders.write");
/// assert_eq!(POLICY, "perm:orders.write");
/// ```
#[macro_export]
macro_rules! permission_policy {
    ($permission:literal) => {
        concat!("perm:", $permission)
    };
}

/// 附加到端点或处理器上的权限门
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasPermission {
    permission: String,
}

impl HasPermission {
    pub fn new(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
        }
    }

    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// 交给授权宿主解析的策略名
    pub fn policy_name(&self) -> String {
        permission_policy_name(&self.permission)
    }
}
