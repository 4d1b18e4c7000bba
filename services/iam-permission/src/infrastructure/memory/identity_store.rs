use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use cuba_common::{RoleId, UserId};
use cuba_errors::AppResult;

use super::lock;
use crate::domain::identity::IdentityStore;

#[derive(Debug, Default)]
struct IdentityState {
    users: HashSet<UserId>,
    roles: HashSet<RoleId>,
    memberships: BTreeSet<(UserId, RoleId)>,
}

/// 进程内身份存储
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    state: Mutex<IdentityState>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: UserId) -> AppResult<()> {
        lock(&self.state)?.users.insert(user_id);
        Ok(())
    }

    pub fn add_role(&self, role_id: RoleId) -> AppResult<()> {
        lock(&self.state)?.roles.insert(role_id);
        Ok(())
    }

    pub fn add_user_to_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        lock(&self.state)?.memberships.insert((user_id, role_id));
        Ok(())
    }

    pub fn remove_user_from_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        lock(&self.state)?.memberships.remove(&(user_id, role_id));
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn role_exists(&self, role_id: &RoleId) -> AppResult<bool> {
        Ok(lock(&self.state)?.roles.contains(role_id))
    }

    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool> {
        Ok(lock(&self.state)?.users.contains(user_id))
    }

    async fn user_role_ids(&self, user_id: &UserId) -> AppResult<Vec<RoleId>> {
        Ok(lock(&self.state)?
            .memberships
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, r)| *r)
            .collect())
    }
}
