//! PostgreSQL 权限仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cuba_common::AuditInfo;
use cuba_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::error_mapper::map_sqlx_error;
use crate::domain::permission::{
    Permission, PermissionGroupId, PermissionId, PermissionRepository,
};

/// 权限查询的公共列
pub(super) const PERMISSION_COLUMNS: &str = "p.id, p.name, p.normalized_name, p.display_name, \
     p.description, p.group_id, p.created_at, p.updated_at, p.is_deleted";

pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn create(&self, permission: &Permission) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        ensure_live_group(&mut tx, permission.group_id.as_ref()).await?;

        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, normalized_name, display_name, description,
                                     group_id, created_at, updated_at, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
            "#,
        )
        .bind(permission.id.0)
        .bind(&permission.name)
        .bind(&permission.normalized_name)
        .bind(&permission.display_name)
        .bind(&permission.description)
        .bind(permission.group_id.map(|g| g.0))
        .bind(permission.audit.created_at)
        .bind(permission.audit.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update(&self, permission: &Permission) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        ensure_live_group(&mut tx, permission.group_id.as_ref()).await?;

        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET name = $2, normalized_name = $3, display_name = $4, description = $5,
                group_id = $6, updated_at = $7
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(permission.id.0)
        .bind(&permission.name)
        .bind(&permission.normalized_name)
        .bind(&permission.display_name)
        .bind(&permission.description)
        .bind(permission.group_id.map(|g| g.0))
        .bind(permission.audit.updated_at.unwrap_or_else(Utc::now))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Permission not found"));
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete(&self, permission: &Permission) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("UPDATE permissions SET is_deleted = TRUE, updated_at = $2 WHERE id = $1")
            .bind(permission.id.0)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
            .bind(permission.id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM user_permissions WHERE permission_id = $1")
            .bind(permission.id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &PermissionId) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p WHERE p.id = $1 AND p.is_deleted = FALSE"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_normalized_name(&self, normalized_name: &str) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p \
             WHERE p.normalized_name = $1 AND p.is_deleted = FALSE"
        ))
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
        exclude: Option<&PermissionId>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM permissions
                WHERE normalized_name = $1 AND is_deleted = FALSE
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(normalized_name)
        .bind(exclude.map(|id| id.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn exists(&self, id: &PermissionId) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn list_all(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p WHERE p.is_deleted = FALSE \
             ORDER BY p.name COLLATE \"C\", p.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_by_group(&self, group_id: &PermissionGroupId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions p \
             WHERE p.group_id = $1 AND p.is_deleted = FALSE \
             ORDER BY p.name COLLATE \"C\", p.id"
        ))
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_group(&self, group_id: &PermissionGroupId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM permissions WHERE group_id = $1 AND is_deleted = FALSE",
        )
        .bind(group_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }
}

/// 以共享锁锁定未删除的权限行
///
/// 与 `delete` 的行更新互斥：授权要么在删除之前提交并被删除事务清理，要么看到已删除状态。
pub(super) async fn lock_live_permission(
    tx: &mut Transaction<'_, Postgres>,
    id: &PermissionId,
) -> AppResult<bool> {
    let row: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM permissions WHERE id = $1 AND is_deleted = FALSE FOR SHARE",
    )
    .bind(id.0)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    Ok(row.is_some())
}

/// 引用的权限组必须存在且未删除，持有共享锁直到事务结束
async fn ensure_live_group(
    tx: &mut Transaction<'_, Postgres>,
    group_id: Option<&PermissionGroupId>,
) -> AppResult<()> {
    let Some(group_id) = group_id else {
        return Ok(());
    };

    let row: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM permission_groups WHERE id = $1 AND is_deleted = FALSE FOR SHARE",
    )
    .bind(group_id.0)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    match row {
        Some(_) => Ok(()),
        None => Err(AppError::validation("Permission group not found")),
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
pub(super) struct PermissionRow {
    id: Uuid,
    name: String,
    normalized_name: String,
    display_name: Option<String>,
    description: Option<String>,
    group_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: PermissionId::from_uuid(row.id),
            name: row.name,
            normalized_name: row.normalized_name,
            display_name: row.display_name,
            description: row.description,
            group_id: row.group_id.map(PermissionGroupId::from_uuid),
            audit: AuditInfo {
                created_at: row.created_at,
                updated_at: row.updated_at,
                is_deleted: row.is_deleted,
            },
        }
    }
}
