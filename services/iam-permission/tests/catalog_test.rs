//! 权限组管理与目录同步测试

mod common;

use common::Fixture;
use cuba_config::{CatalogConfig, PermissionGroupSeed, PermissionSeed};
use iam_permission::PermissionError;
use iam_permission::application::permission::SeedReport;
use iam_permission::domain::permission::{Permission, PermissionGroup};

fn seed(name: &str) -> PermissionSeed {
    PermissionSeed {
        name: name.to_string(),
        display_name: None,
        description: None,
    }
}

fn catalog() -> CatalogConfig {
    CatalogConfig {
        groups: vec![PermissionGroupSeed {
            name: "orders".to_string(),
            display_name: Some("Orders".to_string()),
            order: 10,
            permissions: vec![seed("orders.read"), seed("orders.write")],
        }],
        permissions: vec![seed("reports.export")],
    }
}

#[tokio::test]
async fn test_duplicate_group_name() {
    let fx = Fixture::new();
    fx.groups.create(PermissionGroup::new("orders")).await.unwrap();

    let err = fx
        .groups
        .create(PermissionGroup::new(" orders "))
        .await
        .unwrap_err();

    assert_eq!(err, PermissionError::DuplicateGroupName("orders".to_string()));
}

#[tokio::test]
async fn test_blank_group_name() {
    let fx = Fixture::new();

    let err = fx.groups.create(PermissionGroup::new("")).await.unwrap_err();

    assert_eq!(err, PermissionError::InvalidGroupName);
}

#[tokio::test]
async fn test_groups_are_listed_by_order_then_name() {
    let fx = Fixture::new();
    fx.groups
        .create(PermissionGroup::new("reports").with_order(20))
        .await
        .unwrap();
    fx.groups
        .create(PermissionGroup::new("orders").with_order(20))
        .await
        .unwrap();
    fx.groups
        .create(PermissionGroup::new("admin").with_order(99))
        .await
        .unwrap();
    fx.groups
        .create(PermissionGroup::new("zeta").with_order(1))
        .await
        .unwrap();

    let names: Vec<String> = fx
        .groups
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();

    assert_eq!(names, vec!["zeta", "orders", "reports", "admin"]);
}

#[tokio::test]
async fn test_non_empty_group_cannot_be_deleted() {
    let fx = Fixture::new();
    let group = fx.groups.create(PermissionGroup::new("orders")).await.unwrap();
    let perm = fx
        .manager
        .create(Permission::new("orders.read").in_group(group.id))
        .await
        .unwrap();

    let err = fx.groups.delete(&group).await.unwrap_err();
    assert_eq!(err, PermissionError::GroupInUse("orders".to_string()));
    assert_eq!(fx.manager.find_by_id(&perm.id).await.unwrap().map(|p| p.id), Some(perm.id));

    fx.manager.delete(&perm).await.unwrap();
    fx.groups.delete(&group).await.unwrap();
    assert!(fx.groups.find_by_id(&group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleted_group_accepts_no_permissions() {
    let fx = Fixture::new();
    let group = fx.groups.create(PermissionGroup::new("orders")).await.unwrap();
    fx.groups.delete(&group).await.unwrap();

    let err = fx
        .manager
        .create(Permission::new("orders.read").in_group(group.id))
        .await
        .unwrap_err();
    assert_eq!(err, PermissionError::PermissionGroupNotFound);

    let mut perm = fx.permission("orders.write").await;
    perm.group_id = Some(group.id);
    let err = fx.manager.update(perm).await.unwrap_err();
    assert_eq!(err, PermissionError::PermissionGroupNotFound);
}

#[tokio::test]
async fn test_group_permissions() {
    let fx = Fixture::new();
    let group = fx.groups.create(PermissionGroup::new("orders")).await.unwrap();
    for name in ["orders.write", "orders.read"] {
        fx.manager
            .create(Permission::new(name).in_group(group.id))
            .await
            .unwrap();
    }
    fx.permission("reports.export").await;

    let names: Vec<String> = fx
        .groups
        .get_group_permissions(&group.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["orders.read", "orders.write"]);
}

#[tokio::test]
async fn test_seed_creates_catalog() {
    let fx = Fixture::new();

    let report = fx.seeder().seed(&catalog()).await.unwrap();

    assert_eq!(
        report,
        SeedReport {
            groups_created: 1,
            permissions_created: 3,
            permissions_existing: 0,
        }
    );

    let group = fx.groups.find_by_name("orders").await.unwrap().unwrap();
    assert_eq!(group.order, 10);
    assert_eq!(group.display_name.as_deref(), Some("Orders"));
    assert_eq!(fx.groups.get_group_permissions(&group.id).await.unwrap().len(), 2);

    let export = fx.manager.find_by_name("reports.export").await.unwrap().unwrap();
    assert!(export.group_id.is_none());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let fx = Fixture::new();
    fx.permission("ORDERS.READ").await;

    let first = fx.seeder().seed(&catalog()).await.unwrap();
    assert_eq!(first.permissions_created, 2);
    assert_eq!(first.permissions_existing, 1);

    let second = fx.seeder().seed(&catalog()).await.unwrap();
    assert_eq!(
        second,
        SeedReport {
            groups_created: 0,
            permissions_created: 0,
            permissions_existing: 3,
        }
    );
    assert_eq!(fx.manager.get_all().await.unwrap().len(), 3);
}
