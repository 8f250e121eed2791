use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::Task;

use super::{creation_order, Page, Pagination, StoreError, StoredUser, TaskStore, UserStore};

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<Uuid, StoredUser>,
    by_email: HashMap<String, Uuid>,
}

#[derive(Debug, Clone, Copy)]
struct TokenEntry {
    user_id: Uuid,
    expires_at: Option<Instant>,
}

/// In-process store. Clones share the same maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
    users: Arc<RwLock<Users>>,
    tokens: Arc<RwLock<HashMap<String, TokenEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sorted_tasks<P>(&self, predicate: P) -> Vec<Task>
    where
        P: Fn(&Task) -> bool,
    {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks.values().filter(|t| predicate(t)).cloned().collect();
        matching.sort_by(creation_order);
        matching
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, pagination: Pagination) -> Result<Page<Task>, StoreError> {
        let all = self.sorted_tasks(|_| true).await;
        let total = all.len();
        Ok(Page {
            items: pagination.slice(all),
            total,
        })
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(self.sorted_tasks(|t| t.owner == owner).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &StoredUser) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(&user.email) {
            return Ok(false);
        }
        users.by_email.insert(user.email.clone(), user.id);
        users.by_id.insert(user.id, user.clone());
        Ok(true)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn user(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }

    async fn put_token(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let entry = TokenEntry {
            user_id,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.tokens.write().await.insert(token.to_string(), entry);
        Ok(())
    }

    async fn token_owner(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get(token).copied() {
            Some(entry) if entry.expires_at.is_some_and(|at| at <= Instant::now()) => {
                tokens.remove(token);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.user_id)),
            None => Ok(None),
        }
    }

    async fn revoke_token(&self, token: &str) -> Result<(), StoreError> {
        self.tokens.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use shared::CreateTaskRequest;

    use super::*;

    fn task(owner: Uuid, title: &str, offset_secs: i64) -> Task {
        let mut task = Task::new(
            owner,
            CreateTaskRequest {
                title: title.to_string(),
                description: "d".to_string(),
                ..Default::default()
            },
        );
        task.created_at = Utc::now() + ChronoDuration::seconds(offset_secs);
        task
    }

    #[tokio::test]
    async fn lists_in_creation_order_and_pages() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for (i, title) in ["c", "a", "b"].iter().enumerate() {
            store.put(&task(owner, title, i as i64)).await.unwrap();
        }

        let page = store.list(Pagination::new(Some(1), Some(2))).await.unwrap();
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();

        assert_eq!(page.total, 3);
        assert_eq!(titles, ["c", "a"]);
    }

    #[tokio::test]
    async fn list_by_owner_filters_other_users() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.put(&task(alice, "mine", 0)).await.unwrap();
        store.put(&task(bob, "theirs", 1)).await.unwrap();

        let tasks = store.list_by_owner(alice).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "mine");
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let store = MemoryStore::new();
        let t = task(Uuid::new_v4(), "x", 0);
        store.put(&t).await.unwrap();

        assert!(store.delete(t.id).await.unwrap());
        assert!(!store.delete(t.id).await.unwrap());
        assert!(store.get(t.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let store = MemoryStore::new();
        let user = StoredUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
        };
        let twin = StoredUser {
            id: Uuid::new_v4(),
            ..user.clone()
        };

        assert!(store.insert_user(&user).await.unwrap());
        assert!(!store.insert_user(&twin).await.unwrap());
        let found = store.user_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn expired_tokens_resolve_to_nobody() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store.put_token("live", user_id, None).await.unwrap();
        store
            .put_token("dead", user_id, Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(store.token_owner("live").await.unwrap(), Some(user_id));
        assert_eq!(store.token_owner("dead").await.unwrap(), None);

        store.revoke_token("live").await.unwrap();
        assert_eq!(store.token_owner("live").await.unwrap(), None);
    }
}
