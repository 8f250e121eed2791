use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::{AccessPolicy, Config, StoreBackend};
use crate::service::TaskService;
use crate::store::{MemoryStore, RedisStore, StoreError, TaskStore, UserStore};

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub auth: AuthService,
    pub policy: AccessPolicy,
}

impl AppState {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        config: &Config,
    ) -> Self {
        Self {
            tasks: TaskService::new(tasks),
            auth: AuthService::new(users, config.token_ttl),
            policy: config.access_policy,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        match &config.store {
            StoreBackend::Redis { url } => {
                let store = Arc::new(RedisStore::open(url)?);
                Ok(Self::new(store.clone(), store, config))
            }
            StoreBackend::Memory => Ok(Self::in_memory(config)),
        }
    }

    pub fn in_memory(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, config)
    }
}
