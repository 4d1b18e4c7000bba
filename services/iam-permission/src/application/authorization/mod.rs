//! 授权策略层
//!
//! 把权限名转换为运行时授权决策：`perm:<权限名>` 形式的策略在首次查找时动态合成，
//! 评估时只检查主体上已物化的权限声明，与解析器和存储无关。

pub mod gate;
pub mod handler;
pub mod policy_provider;
pub mod requirement;
pub mod service;

pub use gate::{HasPermission, permission_policy_name};
pub use handler::{AuthorizationContext, AuthorizationHandler, PermissionHandler};
pub use policy_provider::{PermissionPolicyProvider, PolicyProvider, StaticPolicyProvider};
pub use requirement::{AuthorizationPolicy, PERMISSION_POLICY_PREFIX, PermissionRequirement};
pub use service::{AuthorizationDecision, AuthorizationService};
