//! PostgreSQL 角色权限关联仓储实现

use async_trait::async_trait;
use chrono::Utc;
use cuba_common::RoleId;
use cuba_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::error_mapper::map_sqlx_error;
use super::permission_repository::{PERMISSION_COLUMNS, PermissionRow, lock_live_permission};
use crate::domain::permission::{Permission, RolePermission, RolePermissionRepository};

pub struct PostgresRolePermissionRepository {
    pool: PgPool,
}

impl PostgresRolePermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RolePermissionRepository for PostgresRolePermissionRepository {
    async fn add(&self, grant: &RolePermission) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        if !lock_live_permission(&mut tx, &grant.permission_id).await? {
            return Err(AppError::not_found("Permission not found"));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id, granted_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(grant.role_id.0)
        .bind(grant.permission_id.0)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, grant: &RolePermission) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(grant.role_id.0)
                .bind(grant.permission_id.0)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, grant: &RolePermission) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM role_permissions WHERE role_id = $1 AND permission_id = $2)",
        )
        .bind(grant.role_id.0)
        .bind(grant.permission_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn list_permissions(&self, role_id: &RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p \
             INNER JOIN role_permissions rp ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 AND p.is_deleted = FALSE \
             ORDER BY p.name COLLATE \"C\", p.id"
        ))
        .bind(role_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_permissions_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Permission>> {
        let role_uuids: Vec<Uuid> = role_ids.iter().map(|r| r.0).collect();

        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p \
             INNER JOIN role_permissions rp ON p.id = rp.permission_id \
             WHERE rp.role_id = ANY($1) AND p.is_deleted = FALSE"
        ))
        .bind(&role_uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<String>> {
        let role_uuids: Vec<Uuid> = role_ids.iter().map(|r| r.0).collect();

        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name
            FROM permissions p
            INNER JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1) AND p.is_deleted = FALSE
            "#,
        )
        .bind(&role_uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(names)
    }
}
