//! Runtime configuration read from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use shared::Task;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason,
    }
}

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String },
    Memory,
}

/// Who may see and modify a task through the id-addressed endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessPolicy {
    /// A bearer token is required and only the owner can reach the task.
    #[default]
    Owner,
    /// Legacy behaviour: show, update, delete and the global index need no
    /// token and are not scoped to the caller.
    Open,
}

impl AccessPolicy {
    pub fn permits(self, task: &Task, caller: Option<Uuid>) -> bool {
        match self {
            AccessPolicy::Open => true,
            AccessPolicy::Owner => caller == Some(task.owner),
        }
    }
}

impl FromStr for AccessPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(AccessPolicy::Owner),
            "open" => Ok(AccessPolicy::Open),
            _ => Err(invalid("TASK_ACCESS_POLICY", s, "expected `owner` or `open`")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `Default` matches what `from_env` yields with no variables set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub static_dir: String,
    pub access_policy: AccessPolicy,
    pub token_ttl: Option<Duration>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store: StoreBackend::Redis {
                url: DEFAULT_REDIS_URL.to_string(),
            },
            static_dir: "frontend/dist".to_string(),
            access_policy: AccessPolicy::Owner,
            token_ttl: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|_| invalid("BIND_ADDR", &value, "expected host:port"))?,
            None => defaults.bind_addr,
        };

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        let store = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("redis") => StoreBackend::Redis { url: redis_url },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(invalid(
                    "STORE_BACKEND",
                    other,
                    "expected `redis` or `memory`",
                ))
            }
        };

        let access_policy = match lookup("TASK_ACCESS_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.access_policy,
        };

        let token_ttl = match lookup("TOKEN_TTL_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(invalid(
                        "TOKEN_TTL_SECS",
                        &value,
                        "expected a positive number of seconds",
                    ))
                }
            },
            None => defaults.token_ttl,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("LOG_FORMAT", other, "expected `pretty` or `json`")),
        };

        Ok(Self {
            bind_addr,
            store,
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
            access_policy,
            token_ttl,
            log_format,
        })
    }
}
