//! Persistence for tasks, users and bearer tokens.
//!
//! Both backends implement the same traits so the service layer never knows
//! which one it is talking to:
//!
//! - [`RedisStore`] keeps JSON documents in Redis
//! - [`MemoryStore`] keeps everything in process, for tests and local runs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared::{Task, User};

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("redis pool setup failed: {0}")]
    PoolSetup(#[from] deadpool_redis::CreatePoolError),

    #[error("corrupt record {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MAX_PER_PAGE: u32 = 100;

/// 1-based page window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Clamps raw query values into a usable window.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    /// Applies the window to an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A window of tasks plus the size of the whole listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// User record as persisted; the hash never leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

impl StoredUser {
    pub fn public(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// Listings are ordered by `created_at`, ties broken by id.
pub(crate) fn creation_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, pagination: Pagination) -> Result<Page<Task>, StoreError>;

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Inserts or replaces the task, keeping the owner index in sync.
    async fn put(&self, task: &Task) -> Result<(), StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `false` if the email is already registered.
    async fn insert_user(&self, user: &StoredUser) -> Result<bool, StoreError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn user(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError>;

    async fn put_token(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Option<std::time::Duration>,
    ) -> Result<(), StoreError>;

    async fn token_owner(&self, token: &str) -> Result<Option<Uuid>, StoreError>;

    async fn revoke_token(&self, token: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_inputs() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, per_page: 50 });
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, per_page: 1 });
        assert_eq!(
            Pagination::new(Some(3), Some(1_000)),
            Pagination { page: 3, per_page: MAX_PER_PAGE }
        );
    }

    #[test]
    fn pagination_slices_window() {
        let page = Pagination::new(Some(2), Some(2));
        assert_eq!(page.offset(), 2);
        assert_eq!(page.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert!(Pagination::new(Some(4), Some(2)).slice(vec![1, 2, 3]).is_empty());
    }
}
