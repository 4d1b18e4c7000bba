//! 授权需求与策略

/// 动态权限策略名前缀
pub const PERMISSION_POLICY_PREFIX: &str = "perm:";

/// 权限需求：主体必须携带值为 `name` 的权限声明
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionRequirement {
    pub name: String,
}

impl PermissionRequirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 授权策略
///
/// 全部需求都被满足时授权成功；没有任何需求的策略默认拒绝。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    pub name: String,
    pub requirements: Vec<PermissionRequirement>,
}

impl AuthorizationPolicy {
    pub fn new(name: impl Into<String>, requirements: Vec<PermissionRequirement>) -> Self {
        Self {
            name: name.into(),
            requirements,
        }
    }

    /// 只含一个权限需求的策略
    pub fn for_permission(name: impl Into<String>, permission: impl Into<String>) -> Self {
        Self::new(name, vec![PermissionRequirement::new(permission)])
    }
}
