//! PostgreSQL 权限组仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cuba_common::AuditInfo;
use cuba_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::error_mapper::map_sqlx_error;
use crate::domain::permission::{PermissionGroup, PermissionGroupId, PermissionGroupRepository};

const GROUP_COLUMNS: &str = "id, name, display_name, sort_order, created_at, updated_at, is_deleted";

pub struct PostgresPermissionGroupRepository {
    pool: PgPool,
}

impl PostgresPermissionGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionGroupRepository for PostgresPermissionGroupRepository {
    async fn create(&self, group: &PermissionGroup) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_groups (id, name, display_name, sort_order, created_at, updated_at, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            "#,
        )
        .bind(group.id.0)
        .bind(&group.name)
        .bind(&group.display_name)
        .bind(group.order)
        .bind(group.audit.created_at)
        .bind(group.audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, group: &PermissionGroup) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE permission_groups
            SET name = $2, display_name = $3, sort_order = $4, updated_at = $5
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(group.id.0)
        .bind(&group.name)
        .bind(&group.display_name)
        .bind(group.order)
        .bind(group.audit.updated_at.unwrap_or_else(Utc::now))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Permission group not found"));
        }
        Ok(())
    }

    async fn delete(&self, group: &PermissionGroup) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // 行锁与外键检查互斥，阻止并发向该组加入权限
        sqlx::query("SELECT id FROM permission_groups WHERE id = $1 FOR UPDATE")
            .bind(group.id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE group_id = $1 AND is_deleted = FALSE)",
        )
        .bind(group.id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if in_use {
            return Err(AppError::conflict("Permission group still contains permissions"));
        }

        sqlx::query(
            "UPDATE permission_groups SET is_deleted = TRUE, updated_at = $2 WHERE id = $1",
        )
        .bind(group.id.0)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &PermissionGroupId) -> AppResult<Option<PermissionGroup>> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM permission_groups WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<PermissionGroup>> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM permission_groups WHERE name = $1 AND is_deleted = FALSE"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_name(
        &self,
        name: &str,
        exclude: Option<&PermissionGroupId>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM permission_groups
                WHERE name = $1 AND is_deleted = FALSE
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(exclude.map(|id| id.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(exists)
    }

    async fn list_all(&self) -> AppResult<Vec<PermissionGroup>> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM permission_groups WHERE is_deleted = FALSE \
             ORDER BY sort_order, name COLLATE \"C\""
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    display_name: Option<String>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl From<GroupRow> for PermissionGroup {
    fn from(row: GroupRow) -> Self {
        PermissionGroup {
            id: PermissionGroupId::from_uuid(row.id),
            name: row.name,
            display_name: row.display_name,
            order: row.sort_order,
            audit: AuditInfo {
                created_at: row.created_at,
                updated_at: row.updated_at,
                is_deleted: row.is_deleted,
            },
        }
    }
}
