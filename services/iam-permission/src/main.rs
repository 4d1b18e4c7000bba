//! IAM Permission - 权限目录同步入口
//!
//! 加载配置、连接数据库、执行迁移，并把配置中声明的权限目录同步到存储。

use std::sync::Arc;

use anyhow::Context;
use cuba_config::AppConfig;
use cuba_telemetry::{LogFormat, init_tracing};
use iam_permission::application::permission::{PermissionGroupManager, PermissionManager, PermissionSeeder};
use iam_permission::infrastructure::persistence::{
    PostgresIdentityStore, create_pool, postgres_stores, run_migrations,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("config").context("Failed to load configuration")?;

    init_tracing(
        &config.telemetry.log_level,
        LogFormat::from_json_flag(config.telemetry.json),
    );
    info!(
        app = %config.app_name,
        env = %config.app_env,
        claim_type = %config.authorization.claim_type,
        "Starting permission catalog sync"
    );

    let pool = create_pool(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let stores = postgres_stores(pool.clone());
    let identity = Arc::new(PostgresIdentityStore::new(pool.clone()));

    let groups = Arc::new(PermissionGroupManager::new(
        stores.groups.clone(),
        stores.permissions.clone(),
    ));
    let permissions = Arc::new(PermissionManager::new(stores, identity));

    let report = PermissionSeeder::new(permissions, groups)
        .seed(&config.catalog)
        .await
        .context("Failed to seed permission catalog")?;

    info!(
        groups_created = report.groups_created,
        permissions_created = report.permissions_created,
        permissions_existing = report.permissions_existing,
        "Permission catalog sync finished"
    );

    pool.close().await;
    Ok(())
}
