//! PostgreSQL 用户权限关联仓储实现

use async_trait::async_trait;
use chrono::Utc;
use cuba_common::UserId;
use cuba_errors::{AppError, AppResult};
use sqlx::PgPool;

use super::error_mapper::map_sqlx_error;
use super::permission_repository::{PERMISSION_COLUMNS, PermissionRow, lock_live_permission};
use crate::domain::permission::{Permission, UserPermission, UserPermissionRepository};

pub struct PostgresUserPermissionRepository {
    pool: PgPool,
}

impl PostgresUserPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserPermissionRepository for PostgresUserPermissionRepository {
    async fn add(&self, grant: &UserPermission) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        if !lock_live_permission(&mut tx, &grant.permission_id).await? {
            return Err(AppError::not_found("Permission not found"));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id, granted_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, permission_id) DO NOTHING
            "#,
        )
        .bind(grant.user_id.0)
        .bind(grant.permission_id.0)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, grant: &UserPermission) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission_id = $2")
                .bind(grant.user_id.0)
                .bind(grant.permission_id.0)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, grant: &UserPermission) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_permissions WHERE user_id = $1 AND permission_id = $2)",
        )
        .bind(grant.user_id.0)
        .bind(grant.permission_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn list_permissions(&self, user_id: &UserId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p \
             INNER JOIN user_permissions up ON p.id = up.permission_id \
             WHERE up.user_id = $1 AND p.is_deleted = FALSE \
             ORDER BY p.name COLLATE \"C\", p.id"
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn permission_names(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM permissions p
            INNER JOIN user_permissions up ON p.id = up.permission_id
            WHERE up.user_id = $1 AND p.is_deleted = FALSE
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(names)
    }
}
