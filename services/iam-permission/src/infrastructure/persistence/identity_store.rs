//! PostgreSQL 身份存储
//!
//! 只读访问身份系统的 users / roles / user_roles 表。

use async_trait::async_trait;
use cuba_common::{RoleId, UserId};
use cuba_errors::AppResult;
use sqlx::PgPool;
use uuid::Uuid;

use super::error_mapper::map_sqlx_error;
use crate::domain::identity::IdentityStore;

pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn role_exists(&self, role_id: &RoleId) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
            .bind(role_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn user_role_ids(&self, user_id: &UserId) -> AppResult<Vec<RoleId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1")
            .bind(user_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().map(RoleId::from_uuid).collect())
    }
}
