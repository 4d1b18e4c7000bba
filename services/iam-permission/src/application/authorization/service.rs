//! 授权检查服务
//!
//! 单次评估：查找策略 → 运行处理器 → 全部需求满足则允许，否则拒绝。无重试，无副作用。

use std::sync::Arc;

use cuba_auth_core::Principal;
use cuba_config::AuthorizationConfig;
use cuba_errors::{AppError, AppResult};
use metrics::counter;
use tracing::debug;

use super::handler::{AuthorizationContext, AuthorizationHandler, PermissionHandler};
use super::policy_provider::{PermissionPolicyProvider, PolicyProvider};

/// 授权决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allowed,
    /// 未满足的权限需求
    Denied { missing: Vec<String> },
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

pub struct AuthorizationService {
    policies: Arc<dyn PolicyProvider>,
    handlers: Vec<Arc<dyn AuthorizationHandler>>,
}

impl AuthorizationService {
    pub fn new(policies: Arc<dyn PolicyProvider>) -> Self {
        Self {
            policies,
            handlers: Vec::new(),
        }
    }

    /// 按授权配置装配：`perm:` 策略提供者 (回退到 `fallback`) 加权限处理器
    pub fn from_config(fallback: Arc<dyn PolicyProvider>, config: &AuthorizationConfig) -> Self {
        Self::new(Arc::new(PermissionPolicyProvider::from_config(fallback, config)))
            .with_handler(Arc::new(PermissionHandler::from_config(config)))
    }

    pub fn with_handler(mut self, handler: Arc<dyn AuthorizationHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// 按策略名评估主体
    ///
    /// 未知策略名返回 `NotFound`。
    pub async fn authorize(
        &self,
        principal: &Principal,
        policy_name: &str,
    ) -> AppResult<AuthorizationDecision> {
        let policy = self
            .policies
            .get_policy(policy_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Authorization policy '{}' not found", policy_name)))?;

        let mut context = AuthorizationContext::new(principal, &policy.requirements);
        for handler in &self.handlers {
            handler.handle(&mut context);
        }

        let decision = if context.has_succeeded() {
            AuthorizationDecision::Allowed
        } else {
            AuthorizationDecision::Denied {
                missing: context.pending_requirements().map(|r| r.name.clone()).collect(),
            }
        };

        counter!(
            "permission_authorization_checks_total",
            "allowed" => decision.is_allowed().to_string()
        )
        .increment(1);
        debug!(
            policy = %policy_name,
            subject = ?principal.subject,
            allowed = decision.is_allowed(),
            "Authorization evaluated"
        );

        Ok(decision)
    }

    /// 评估并把拒绝转换为 `Forbidden`
    pub async fn require(&self, principal: &Principal, policy_name: &str) -> AppResult<()> {
        match self.authorize(principal, policy_name).await? {
            AuthorizationDecision::Allowed => Ok(()),
            AuthorizationDecision::Denied { missing } => Err(AppError::forbidden(format!(
                "Missing permission: {}",
                missing.join(", ")
            ))),
        }
    }
}
