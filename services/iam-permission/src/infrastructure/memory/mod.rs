//! 进程内存储
//!
//! 与 PostgreSQL 实现遵循同样的唯一性与可见性规则，用于测试和嵌入式场景。

mod identity_store;
mod permission_store;

pub use identity_store::InMemoryIdentityStore;
pub use permission_store::InMemoryPermissionStore;

use std::sync::{Mutex, MutexGuard};

use cuba_errors::{AppError, AppResult};

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::internal("In-memory store lock poisoned"))
}
