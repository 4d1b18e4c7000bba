//! 测试夹具：基于进程内存储装配完整的权限服务

#![allow(dead_code)]

use std::sync::Arc;

use cuba_common::{RoleId, UserId};
use iam_permission::application::permission::{
    PermissionGroupManager, PermissionManager, PermissionResolver, PermissionSeeder,
    UserPermissionManager,
};
use iam_permission::domain::permission::{Permission, PermissionStores};
use iam_permission::infrastructure::memory::{InMemoryIdentityStore, InMemoryPermissionStore};

pub struct Fixture {
    pub identity: Arc<InMemoryIdentityStore>,
    pub store: Arc<InMemoryPermissionStore>,
    pub manager: Arc<PermissionManager>,
    pub groups: Arc<PermissionGroupManager>,
    pub resolver: Arc<PermissionResolver>,
    pub users: UserPermissionManager,
}

impl Fixture {
    pub fn new() -> Self {
        let identity = Arc::new(InMemoryIdentityStore::new());
        let store = Arc::new(InMemoryPermissionStore::new());
        let stores = PermissionStores::from_shared(store.clone());

        let manager = Arc::new(PermissionManager::new(stores.clone(), identity.clone()));
        let groups = Arc::new(PermissionGroupManager::new(
            stores.groups.clone(),
            stores.permissions.clone(),
        ));
        let resolver = Arc::new(PermissionResolver::new(
            stores.user_permissions.clone(),
            stores.role_permissions.clone(),
            identity.clone(),
        ));
        let users = UserPermissionManager::new(manager.clone(), resolver.clone());

        Self {
            identity,
            store,
            manager,
            groups,
            resolver,
            users,
        }
    }

    pub fn seeder(&self) -> PermissionSeeder {
        PermissionSeeder::new(self.manager.clone(), self.groups.clone())
    }

    pub fn user(&self) -> UserId {
        let user_id = UserId::new();
        self.identity.add_user(user_id).unwrap();
        user_id
    }

    pub fn role(&self) -> RoleId {
        let role_id = RoleId::new();
        self.identity.add_role(role_id).unwrap();
        role_id
    }

    pub async fn permission(&self, name: &str) -> Permission {
        self.manager.create(Permission::new(name)).await.unwrap()
    }
}
