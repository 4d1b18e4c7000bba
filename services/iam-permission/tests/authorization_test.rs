//! 授权策略层端到端测试
//!
//! 解析有效权限 → 物化为声明 → 按 `perm:<name>` 策略评估。

mod common;

use std::sync::Arc;

use common::Fixture;
use cuba_auth_core::{PermissionClaims, Principal};
use cuba_config::AuthorizationConfig;
use cuba_errors::AppError;
use iam_permission::application::authorization::{
    AuthorizationDecision, AuthorizationPolicy, AuthorizationService, HasPermission,
    PermissionHandler, PermissionPolicyProvider, StaticPolicyProvider,
};

fn config(claim_type: &str) -> AuthorizationConfig {
    AuthorizationConfig {
        claim_type: claim_type.to_string(),
        policy_cache_capacity: 64,
    }
}

fn service_with(fallback: StaticPolicyProvider, config: &AuthorizationConfig) -> AuthorizationService {
    AuthorizationService::from_config(Arc::new(fallback), config)
}

fn service() -> AuthorizationService {
    service_with(StaticPolicyProvider::new(), &AuthorizationConfig::default())
}

#[tokio::test]
async fn test_claim_grants_access_to_permission_policy() {
    let service = service();
    let mut principal = Principal::new("u1");

    let decision = service.authorize(&principal, "perm:orders.write").await.unwrap();
    assert_eq!(
        decision,
        AuthorizationDecision::Denied {
            missing: vec!["orders.write".to_string()]
        }
    );

    PermissionClaims::from_config(&AuthorizationConfig::default())
        .materialize(&mut principal, ["orders.write"]);

    let decision = service.authorize(&principal, "perm:orders.write").await.unwrap();
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn test_resolved_permissions_drive_authorization() {
    let fx = Fixture::new();
    let user_id = fx.user();
    let staff = fx.role();
    fx.identity.add_user_to_role(user_id, staff).unwrap();
    let read = fx.permission("orders.read").await;
    fx.permission("orders.write").await;
    fx.manager.add_to_role(&read.id, &staff).await.unwrap();

    let claims = PermissionClaims::from_config(&AuthorizationConfig::default());
    let mut principal = Principal::new(user_id.to_string());
    claims.materialize(&mut principal, fx.resolver.resolve(&user_id, None).await.unwrap());

    let service = service();
    let read_gate = HasPermission::new("orders.read");
    let write_gate = HasPermission::new("orders.write");

    service.require(&principal, &read_gate.policy_name()).await.unwrap();
    let err = service
        .require(&principal, &write_gate.policy_name())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(msg) if msg.contains("orders.write")));
}

#[tokio::test]
async fn test_claim_match_ignores_case() {
    let service = service();
    let principal = Principal::new("u1").with_claim("permission", "ORDERS.WRITE");

    let decision = service.authorize(&principal, "perm:orders.write").await.unwrap();

    assert!(decision.is_allowed());
}

#[tokio::test]
async fn test_configured_claim_type_links_materializer_and_handler() {
    let fx = Fixture::new();
    let user_id = fx.user();
    fx.permission("orders.write").await;
    fx.users.grant(&user_id, ["orders.write"]).await.unwrap();

    let config = config("urn:acme:permission");
    let claims = PermissionClaims::from_config(&config);
    let mut principal = Principal::new(user_id.to_string());
    claims.materialize(&mut principal, fx.users.list(&user_id).await.unwrap());

    let service = service_with(StaticPolicyProvider::new(), &config);
    assert!(service.authorize(&principal, "perm:orders.write").await.unwrap().is_allowed());

    // 默认声明类型的服务看不到这些声明
    assert!(!self::service().authorize(&principal, "perm:orders.write").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_service_assembled_from_parts() {
    let provider = PermissionPolicyProvider::new(Arc::new(StaticPolicyProvider::new()), 8);
    let service = AuthorizationService::new(Arc::new(provider))
        .with_handler(Arc::new(PermissionHandler::new("permission")));
    let principal = Principal::new("u1").with_claim("permission", "orders.read");

    assert!(service.authorize(&principal, "perm:orders.read").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_claim_type_must_match_configuration() {
    let service = service_with(StaticPolicyProvider::new(), &config("urn:acme:permission"));
    let principal = Principal::new("u1").with_claim("permission", "orders.write");

    let decision = service.authorize(&principal, "perm:orders.write").await.unwrap();
    assert!(!decision.is_allowed());

    let principal = principal.with_claim("urn:acme:permission", "orders.write");
    let decision = service.authorize(&principal, "perm:orders.write").await.unwrap();
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn test_anonymous_principal_is_denied() {
    let service = service();

    let decision = service
        .authorize(&Principal::anonymous(), "perm:orders.read")
        .await
        .unwrap();

    assert!(!decision.is_allowed());
}

#[tokio::test]
async fn test_unknown_policy_is_not_found() {
    let service = service();

    let err = service
        .authorize(&Principal::new("u1"), "reports")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_static_policies_still_resolve() {
    let fallback = StaticPolicyProvider::new()
        .with_policy(AuthorizationPolicy::for_permission("admin", "system.admin"))
        .with_policy(AuthorizationPolicy::new("empty", Vec::new()));
    let service = service_with(fallback, &AuthorizationConfig::default());
    let principal = Principal::new("u1").with_claim("permission", "system.admin");

    assert!(service.authorize(&principal, "admin").await.unwrap().is_allowed());
    // 没有任何需求的策略不放行
    assert!(!service.authorize(&principal, "empty").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_macro_policy_name_authorizes() {
    let service = service();
    let principal = Principal::new("u1").with_claim("permission", "reports.export");

    let decision = service
        .authorize(&principal, iam_permission::permission_policy!("reports.export"))
        .await
        .unwrap();

    assert!(decision.is_allowed());
}
