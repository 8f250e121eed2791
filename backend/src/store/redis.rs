//! Redis-backed store.
//!
//! Key layout:
//!
//! - `task:{id}` -> task JSON
//! - `tasks:index` -> ZSET of task ids scored by creation time (ms)
//! - `user:{id}:tasks` -> SET of task ids owned by the user
//! - `user:{id}` -> user JSON
//! - `user_email:{email}` -> user id
//! - `token:{token}` -> user id, optionally with a TTL

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;
use uuid::Uuid;

use shared::Task;

use super::{creation_order, Page, Pagination, StoreError, StoredUser, TaskStore, UserStore};

const TASK_INDEX_KEY: &str = "tasks:index";

/// Claims the email and writes the user in one step. KEYS: email, user.
/// ARGV: user id, user JSON.
const INSERT_USER_SCRIPT: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('SET', KEYS[2], ARGV[2])
    return 1
end
return 0
";

fn task_key(id: impl Display) -> String {
    format!("task:{id}")
}

fn owner_tasks_key(owner: Uuid) -> String {
    format!("user:{owner}:tasks")
}

fn user_key(id: Uuid) -> String {
    format!("user:{id}")
}

fn email_key(email: &str) -> String {
    format!("user_email:{email}")
}

fn token_key(token: &str) -> String {
    format!("token:{token}")
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// Store over a `deadpool-redis` pool; clones share the pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds the pool. No connection is opened until the first call.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let pool = PoolConfig::from_url(url).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        Ok(self.pool.get().await?)
    }

    async fn fetch_task(conn: &mut Connection, id: Uuid) -> Result<Option<Task>, StoreError> {
        let key = task_key(id);
        let json: Option<String> = conn.get(&key).await?;
        json.map(|json| decode(&key, &json)).transpose()
    }

    async fn load_tasks(conn: &mut Connection, ids: Vec<String>) -> Result<Vec<Task>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| task_key(id)).collect();
        let docs: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(conn).await?;
        let mut tasks = Vec::with_capacity(docs.len());
        // Index entries can outlive their document if a writer died mid-way.
        for (key, json) in keys.iter().zip(docs) {
            if let Some(json) = json {
                tasks.push(decode(key, &json)?);
            }
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskStore for RedisStore {
    async fn list(&self, pagination: Pagination) -> Result<Page<Task>, StoreError> {
        let mut conn = self.connection().await?;
        let total: usize = conn.zcard(TASK_INDEX_KEY).await?;
        let start = pagination.offset() as isize;
        let stop = start + pagination.per_page as isize - 1;
        let ids: Vec<String> = conn.zrange(TASK_INDEX_KEY, start, stop).await?;
        let items = Self::load_tasks(&mut conn, ids).await?;
        Ok(Page { items, total })
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(owner_tasks_key(owner)).await?;
        let mut tasks = Self::load_tasks(&mut conn, ids).await?;
        tasks.sort_by(creation_order);
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let mut conn = self.connection().await?;
        Self::fetch_task(&mut conn, id).await
    }

    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        let json = serde_json::to_string(task)?;
        let score = task.created_at.timestamp_millis();
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .set(task_key(task.id), json)
            .ignore()
            .sadd(owner_tasks_key(task.owner), task.id.to_string())
            .ignore()
            .zadd(TASK_INDEX_KEY, task.id.to_string(), score)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let Some(task) = Self::fetch_task(&mut conn, id).await? else {
            return Ok(false);
        };
        let (deleted,): (usize,) = redis::pipe()
            .atomic()
            .del(task_key(id))
            .srem(owner_tasks_key(task.owner), id.to_string())
            .ignore()
            .zrem(TASK_INDEX_KEY, id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl UserStore for RedisStore {
    async fn insert_user(&self, user: &StoredUser) -> Result<bool, StoreError> {
        let json = serde_json::to_string(user)?;
        let mut conn = self.connection().await?;
        let inserted: bool = redis::Script::new(INSERT_USER_SCRIPT)
            .key(email_key(&user.email))
            .key(user_key(user.id))
            .arg(user.id.to_string())
            .arg(json)
            .invoke_async(&mut conn)
            .await?;
        Ok(inserted)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut conn = self.connection().await?;
        let id: Option<String> = conn.get(email_key(email)).await?;
        let Some(id) = id.and_then(|id| Uuid::parse_str(&id).ok()) else {
            return Ok(None);
        };
        let key = user_key(id);
        let json: Option<String> = conn.get(&key).await?;
        json.map(|json| decode(&key, &json)).transpose()
    }

    async fn user(&self, id: Uuid) -> Result<Option<StoredUser>, StoreError> {
        let mut conn = self.connection().await?;
        let key = user_key(id);
        let json: Option<String> = conn.get(&key).await?;
        json.map(|json| decode(&key, &json)).transpose()
    }

    async fn put_token(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(token_key(token)).arg(user_id.to_string());
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs());
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn token_owner(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let mut conn = self.connection().await?;
        let id: Option<String> = conn.get(token_key(token)).await?;
        Ok(id.and_then(|id| Uuid::parse_str(&id).ok()))
    }

    async fn revoke_token(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(token_key(token)).await?;
        Ok(())
    }
}
