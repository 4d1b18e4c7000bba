//! 用户权限门面
//!
//! 面向只持有权限名 (而非 ID) 的调用方。

use std::sync::Arc;

use cuba_common::UserId;
use tracing::{debug, warn};

use super::manager::PermissionManager;
use super::resolver::PermissionResolver;
use crate::error::{PermissionError, PermissionResult};

pub struct UserPermissionManager {
    manager: Arc<PermissionManager>,
    resolver: Arc<PermissionResolver>,
}

impl UserPermissionManager {
    pub fn new(manager: Arc<PermissionManager>, resolver: Arc<PermissionResolver>) -> Self {
        Self { manager, resolver }
    }

    /// 按名称直接授予用户权限
    ///
    /// 遇到无法解析的名称立即停止并返回 `PermissionNotFound`。
    /// 已经成功的授予不会回滚：失败时调用方必须把部分成功视为真实可能的结果。
    pub async fn grant<I, S>(&self, user_id: &UserId, permission_names: I) -> PermissionResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in clean(permission_names) {
            let Some(permission) = self.manager.find_by_name(&name).await? else {
                warn!(%user_id, permission = %name, "Grant aborted on unknown permission");
                return Err(PermissionError::PermissionNotFound);
            };
            self.manager.add_to_user(&permission.id, user_id).await?;
        }
        Ok(())
    }

    /// 按名称撤销用户的直接权限
    ///
    /// 未知名称被跳过；已解析名称的撤销失败会中止并返回该错误。
    pub async fn revoke<I, S>(&self, user_id: &UserId, permission_names: I) -> PermissionResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in clean(permission_names) {
            let Some(permission) = self.manager.find_by_name(&name).await? else {
                debug!(%user_id, permission = %name, "Skipping revoke of unknown permission");
                continue;
            };
            self.manager.remove_from_user(&permission.id, user_id).await?;
        }
        Ok(())
    }

    /// 用户的有效权限名
    pub async fn list(&self, user_id: &UserId) -> PermissionResult<Vec<String>> {
        Ok(self.resolver.resolve(user_id, None).await?)
    }

    pub async fn has(&self, user_id: &UserId, permission_name: &str) -> PermissionResult<bool> {
        self.manager.user_has(user_id, permission_name).await
    }
}

fn clean<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
