//! 权限管理器测试
//!
//! 覆盖：
//! - 名称校验与规范化唯一性
//! - 逻辑删除与重建
//! - 角色/用户授权的幂等性与存在性检查
//! - 并发创建与授权
//! - 授权与删除竞争

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::Fixture;
use cuba_common::{RoleId, UserId};
use cuba_errors::AppResult;
use futures::future::join_all;
use iam_permission::PermissionError;
use iam_permission::application::permission::PermissionManager;
use iam_permission::domain::permission::{
    Permission, PermissionGroupId, PermissionRepository, PermissionStores, UserPermission,
    UserPermissionRepository,
};
use iam_permission::infrastructure::memory::InMemoryPermissionStore;

/// 在写入授权前删除目标权限，模拟存在性检查之后的并发删除
struct DeleteBeforeGrant {
    inner: Arc<InMemoryPermissionStore>,
}

#[async_trait]
impl UserPermissionRepository for DeleteBeforeGrant {
    async fn add(&self, grant: &UserPermission) -> AppResult<bool> {
        if let Some(permission) =
            PermissionRepository::find_by_id(self.inner.as_ref(), &grant.permission_id).await?
        {
            PermissionRepository::delete(self.inner.as_ref(), &permission).await?;
        }
        UserPermissionRepository::add(self.inner.as_ref(), grant).await
    }

    async fn remove(&self, grant: &UserPermission) -> AppResult<bool> {
        UserPermissionRepository::remove(self.inner.as_ref(), grant).await
    }

    async fn exists(&self, grant: &UserPermission) -> AppResult<bool> {
        UserPermissionRepository::exists(self.inner.as_ref(), grant).await
    }

    async fn list_permissions(&self, user_id: &UserId) -> AppResult<Vec<Permission>> {
        UserPermissionRepository::list_permissions(self.inner.as_ref(), user_id).await
    }

    async fn permission_names(&self, user_id: &UserId) -> AppResult<Vec<String>> {
        UserPermissionRepository::permission_names(self.inner.as_ref(), user_id).await
    }
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let fx = Fixture::new();

    let err = fx.manager.create(Permission::new("   ")).await.unwrap_err();

    assert_eq!(err, PermissionError::InvalidPermissionName);
    assert_eq!(err.code(), "InvalidPermissionName");
}

#[tokio::test]
async fn test_create_trims_and_normalizes() {
    let fx = Fixture::new();

    let created = fx.manager.create(Permission::new("  orders.read ")).await.unwrap();

    assert_eq!(created.name, "orders.read");
    assert_eq!(created.normalized_name, "ORDERS.READ");
}

#[tokio::test]
async fn test_duplicate_name_differing_only_in_case() {
    let fx = Fixture::new();
    fx.permission("orders.read").await;

    let err = fx
        .manager
        .create(Permission::new("Orders.Read"))
        .await
        .unwrap_err();

    assert!(matches!(err, PermissionError::DuplicateName(name) if name == "Orders.Read"));
    assert_eq!(fx.manager.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_in_unknown_group() {
    let fx = Fixture::new();

    let err = fx
        .manager
        .create(Permission::new("orders.read").in_group(PermissionGroupId::new()))
        .await
        .unwrap_err();

    assert_eq!(err, PermissionError::PermissionGroupNotFound);
}

#[tokio::test]
async fn test_update_excludes_self_from_duplicate_check() {
    let fx = Fixture::new();
    let mut perm = fx.permission("orders.read").await;

    perm.name = "ORDERS.read".to_string();
    perm.display_name = Some("Read orders".to_string());
    let updated = fx.manager.update(perm).await.unwrap();

    assert_eq!(updated.name, "ORDERS.read");
    assert!(updated.audit.updated_at.is_some());
}

#[tokio::test]
async fn test_update_to_taken_name() {
    let fx = Fixture::new();
    fx.permission("orders.read").await;
    let mut other = fx.permission("orders.write").await;

    other.name = "orders.READ".to_string();
    let err = fx.manager.update(other.clone()).await.unwrap_err();

    assert!(matches!(err, PermissionError::DuplicateName(_)));
    let stored = fx.manager.find_by_id(&other.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "orders.write");
}

#[tokio::test]
async fn test_update_deleted_permission() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;
    fx.manager.delete(&perm).await.unwrap();

    let err = fx.manager.update(perm).await.unwrap_err();

    assert_eq!(err, PermissionError::PermissionNotFound);
}

#[tokio::test]
async fn test_find_by_name_is_case_insensitive() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;

    let found = fx.manager.find_by_name(" ORDERS.READ ").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(perm.id));

    assert!(fx.manager.find_by_name("").await.unwrap().is_none());
    assert!(fx.manager.find_by_name("orders.write").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_hides_permission_and_frees_name() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;

    fx.manager.delete(&perm).await.unwrap();

    assert!(fx.manager.find_by_id(&perm.id).await.unwrap().is_none());
    assert!(fx.manager.find_by_name("orders.read").await.unwrap().is_none());
    assert!(fx.manager.get_all().await.unwrap().is_empty());

    let recreated = fx.permission("orders.read").await;
    assert_ne!(recreated.id, perm.id);
}

#[tokio::test]
async fn test_delete_removes_role_and_user_grants() {
    let fx = Fixture::new();
    let role_id = fx.role();
    let user_id = fx.user();
    let perm = fx.permission("orders.read").await;
    fx.manager.add_to_role(&perm.id, &role_id).await.unwrap();
    fx.manager.add_to_user(&perm.id, &user_id).await.unwrap();

    fx.manager.delete(&perm).await.unwrap();

    assert_eq!(fx.store.role_grant_count().unwrap(), 0);
    assert_eq!(fx.store.user_grant_count().unwrap(), 0);
    assert!(fx.manager.get_role_permissions(&role_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_to_role_requires_existing_role_and_permission() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;
    let role_id = fx.role();

    let err = fx
        .manager
        .add_to_role(&perm.id, &RoleId::new())
        .await
        .unwrap_err();
    assert_eq!(err, PermissionError::RoleNotFound);

    let missing = Permission::new("ghost");
    let err = fx.manager.add_to_role(&missing.id, &role_id).await.unwrap_err();
    assert_eq!(err, PermissionError::PermissionNotFound);
}

#[tokio::test]
async fn test_add_to_role_is_idempotent() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;
    let role_id = fx.role();

    fx.manager.add_to_role(&perm.id, &role_id).await.unwrap();
    fx.manager.add_to_role(&perm.id, &role_id).await.unwrap();

    assert_eq!(fx.store.role_grant_count().unwrap(), 1);
    let names: Vec<String> = fx
        .manager
        .get_role_permissions(&role_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["orders.read"]);
}

#[tokio::test]
async fn test_remove_missing_grant_succeeds() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;

    fx.manager
        .remove_from_role(&perm.id, &RoleId::new())
        .await
        .unwrap();
    fx.manager
        .remove_from_user(&perm.id, &UserId::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_to_user_requires_existing_user() {
    let fx = Fixture::new();
    let perm = fx.permission("orders.read").await;

    let err = fx
        .manager
        .add_to_user(&perm.id, &UserId::new())
        .await
        .unwrap_err();

    assert_eq!(err, PermissionError::UserNotFound);
}

#[tokio::test]
async fn test_user_permissions_are_deduplicated_and_sorted() {
    let fx = Fixture::new();
    let user_id = fx.user();
    let role_id = fx.role();
    fx.identity.add_user_to_role(user_id, role_id).unwrap();

    let write = fx.permission("orders.write").await;
    let read = fx.permission("orders.read").await;
    fx.manager.add_to_role(&read.id, &role_id).await.unwrap();
    fx.manager.add_to_user(&read.id, &user_id).await.unwrap();
    fx.manager.add_to_user(&write.id, &user_id).await.unwrap();

    let names: Vec<String> = fx
        .manager
        .get_user_permissions(&user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["orders.read", "orders.write"]);
}

#[tokio::test]
async fn test_user_has() {
    let fx = Fixture::new();
    let user_id = fx.user();
    let perm = fx.permission("orders.read").await;
    fx.manager.add_to_user(&perm.id, &user_id).await.unwrap();

    assert!(fx.manager.user_has(&user_id, "orders.read").await.unwrap());
    assert!(fx.manager.user_has(&user_id, "Orders.Read").await.unwrap());
    assert!(!fx.manager.user_has(&user_id, "orders.write").await.unwrap());
    assert!(!fx.manager.user_has(&user_id, "  ").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_of_same_name() {
    let fx = Fixture::new();

    let attempts = (0..16).map(|_| {
        let manager = fx.manager.clone();
        tokio::spawn(async move { manager.create(Permission::new("orders.read")).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(PermissionError::DuplicateName(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(fx.manager.get_all().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_leave_one_row() {
    let fx = Fixture::new();
    let user_id = fx.user();
    let role_id = fx.role();
    let perm = fx.permission("orders.read").await;

    let attempts = (0..16).map(|_| {
        let manager = fx.manager.clone();
        tokio::spawn(async move {
            manager.add_to_user(&perm.id, &user_id).await?;
            manager.add_to_role(&perm.id, &role_id).await
        })
    });
    let results = join_all(attempts).await;

    assert!(results.into_iter().all(|joined| joined.unwrap().is_ok()));
    assert_eq!(fx.store.user_grant_count().unwrap(), 1);
    assert_eq!(fx.store.role_grant_count().unwrap(), 1);
}

#[tokio::test]
async fn test_grant_racing_delete_reports_missing_permission() {
    let fx = Fixture::new();
    let user_id = fx.user();
    let perm = fx.permission("orders.read").await;

    let stores = PermissionStores {
        user_permissions: Arc::new(DeleteBeforeGrant {
            inner: fx.store.clone(),
        }),
        ..PermissionStores::from_shared(fx.store.clone())
    };
    let manager = PermissionManager::new(stores, fx.identity.clone());

    let err = manager.add_to_user(&perm.id, &user_id).await.unwrap_err();

    assert_eq!(err, PermissionError::PermissionNotFound);
    assert_eq!(fx.store.user_grant_count().unwrap(), 0);
    assert!(fx.users.list(&user_id).await.unwrap().is_empty());
}
