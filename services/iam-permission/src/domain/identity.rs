//! 身份存储能力接口
//!
//! 用户与角色本身由外部身份系统管理，这里只消费存在性检查和角色成员关系。

use async_trait::async_trait;
use cuba_common::{RoleId, UserId};
use cuba_errors::AppResult;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn role_exists(&self, role_id: &RoleId) -> AppResult<bool>;

    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool>;

    /// 用户所属的全部角色
    async fn user_role_ids(&self, user_id: &UserId) -> AppResult<Vec<RoleId>>;
}
