//! 策略提供者

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cuba_config::AuthorizationConfig;
use cuba_errors::AppResult;
use moka::future::Cache;
use tracing::debug;

use super::requirement::{AuthorizationPolicy, PERMISSION_POLICY_PREFIX};

/// 按名称提供授权策略
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn get_policy(&self, name: &str) -> AppResult<Option<Arc<AuthorizationPolicy>>>;
}

/// 静态注册的策略表，作为宿主的默认提供者
#[derive(Debug, Default)]
pub struct StaticPolicyProvider {
    policies: HashMap<String, Arc<AuthorizationPolicy>>,
}

impl StaticPolicyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policies.insert(policy.name.clone(), Arc::new(policy));
        self
    }
}

#[async_trait]
impl PolicyProvider for StaticPolicyProvider {
    async fn get_policy(&self, name: &str) -> AppResult<Option<Arc<AuthorizationPolicy>>> {
        Ok(self.policies.get(name).cloned())
    }
}

/// 权限策略提供者
///
/// `perm:<权限名>` 不需要预先注册：首次查找时合成只含一个权限需求的策略并缓存。
/// 合成是纯函数，并发查找重复合成无副作用。其他名称交给回退提供者。
pub struct PermissionPolicyProvider {
    fallback: Arc<dyn PolicyProvider>,
    cache: Cache<String, Arc<AuthorizationPolicy>>,
}

impl PermissionPolicyProvider {
    pub fn new(fallback: Arc<dyn PolicyProvider>, max_capacity: u64) -> Self {
        Self {
            fallback,
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// 缓存容量取自授权配置
    pub fn from_config(fallback: Arc<dyn PolicyProvider>, config: &AuthorizationConfig) -> Self {
        Self::new(fallback, config.policy_cache_capacity)
    }
}

#[async_trait]
impl PolicyProvider for PermissionPolicyProvider {
    async fn get_policy(&self, name: &str) -> AppResult<Option<Arc<AuthorizationPolicy>>> {
        let permission = match name.strip_prefix(PERMISSION_POLICY_PREFIX) {
            Some(permission) if !permission.trim().is_empty() => permission,
            _ => return self.fallback.get_policy(name).await,
        };

        let policy = self
            .cache
            .get_with(name.to_string(), async {
                debug!(policy = %name, "Synthesized permission policy");
                Arc::new(AuthorizationPolicy::for_permission(name, permission))
            })
            .await;

        Ok(Some(policy))
    }
}
