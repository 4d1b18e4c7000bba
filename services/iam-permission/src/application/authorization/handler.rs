//! 权限需求处理器

use cuba_auth_core::Principal;
use cuba_config::AuthorizationConfig;

use super::requirement::PermissionRequirement;

/// 单次授权检查的上下文
///
/// 每个需求初始为待定 (pending)；处理器只能把需求标记为成功，无法显式失败。
/// 检查结束时仍有待定需求即拒绝。
#[derive(Debug)]
pub struct AuthorizationContext<'a> {
    principal: &'a Principal,
    requirements: &'a [PermissionRequirement],
    succeeded: Vec<bool>,
}

impl<'a> AuthorizationContext<'a> {
    pub fn new(principal: &'a Principal, requirements: &'a [PermissionRequirement]) -> Self {
        Self {
            principal,
            requirements,
            succeeded: vec![false; requirements.len()],
        }
    }

    pub fn principal(&self) -> &'a Principal {
        self.principal
    }

    pub fn requirements(&self) -> &'a [PermissionRequirement] {
        self.requirements
    }

    /// 标记需求已满足
    pub fn succeed(&mut self, requirement: &PermissionRequirement) {
        for (done, candidate) in self.succeeded.iter_mut().zip(self.requirements) {
            if candidate == requirement {
                *done = true;
            }
        }
    }

    /// 仍未满足的需求
    pub fn pending_requirements(&self) -> impl Iterator<Item = &'a PermissionRequirement> + '_ {
        self.requirements
            .iter()
            .zip(&self.succeeded)
            .filter(|(_, done)| !**done)
            .map(|(r, _)| r)
    }

    /// 至少有一个需求且全部满足
    pub fn has_succeeded(&self) -> bool {
        !self.requirements.is_empty() && self.succeeded.iter().all(|done| *done)
    }
}

/// 授权处理器
pub trait AuthorizationHandler: Send + Sync {
    fn handle(&self, context: &mut AuthorizationContext<'_>);
}

/// 权限处理器
///
/// 主体携带 `claim_type` 类型、值与需求权限名忽略大小写相等的声明时满足需求。
/// `claim_type` 必须与物化权限声明时使用的值一致。
#[derive(Debug, Clone)]
pub struct PermissionHandler {
    claim_type: String,
}

impl PermissionHandler {
    pub fn new(claim_type: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
        }
    }

    /// 使用授权配置中的声明类型，与 `PermissionClaims::from_config` 保持一致
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self::new(config.claim_type.clone())
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    fn is_satisfied(&self, principal: &Principal, requirement: &PermissionRequirement) -> bool {
        principal
            .find_all(&self.claim_type)
            .any(|value| eq_ignore_case(value, &requirement.name))
    }
}

impl AuthorizationHandler for PermissionHandler {
    fn handle(&self, context: &mut AuthorizationContext<'_>) {
        let principal = context.principal();
        let satisfied: Vec<&PermissionRequirement> = context
            .pending_requirements()
            .filter(|r| self.is_satisfied(principal, r))
            .collect();

        for requirement in satisfied {
            context.succeed(requirement);
        }
    }
}

/// 与默认查找规范化器相同的大写折叠
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}
