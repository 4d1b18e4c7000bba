//! 权限应用服务

pub mod group_manager;
pub mod manager;
pub mod resolver;
pub mod seeder;
pub mod user_permissions;

pub use group_manager::PermissionGroupManager;
pub use manager::PermissionManager;
pub use resolver::PermissionResolver;
pub use seeder::{PermissionSeeder, SeedReport};
pub use user_permissions::UserPermissionManager;
