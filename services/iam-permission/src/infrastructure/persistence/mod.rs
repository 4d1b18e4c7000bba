//! PostgreSQL 持久化

mod connection;
mod error_mapper;
mod group_repository;
mod identity_store;
mod permission_repository;
mod role_permission_repository;
mod user_permission_repository;

use std::sync::Arc;

pub use connection::{create_pool, run_migrations};
pub use error_mapper::map_sqlx_error;
pub use group_repository::PostgresPermissionGroupRepository;
pub use identity_store::PostgresIdentityStore;
pub use permission_repository::PostgresPermissionRepository;
pub use role_permission_repository::PostgresRolePermissionRepository;
pub use user_permission_repository::PostgresUserPermissionRepository;

use sqlx::PgPool;

use crate::domain::permission::PermissionStores;

/// 基于同一连接池构造全部权限仓储
pub fn postgres_stores(pool: PgPool) -> PermissionStores {
    PermissionStores {
        permissions: Arc::new(PostgresPermissionRepository::new(pool.clone())),
        groups: Arc::new(PostgresPermissionGroupRepository::new(pool.clone())),
        role_permissions: Arc::new(PostgresRolePermissionRepository::new(pool.clone())),
        user_permissions: Arc::new(PostgresUserPermissionRepository::new(pool)),
    }
}
