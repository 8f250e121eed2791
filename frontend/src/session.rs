//! The signed-in user's token and id, persisted in `localStorage`.

use uuid::Uuid;
use web_sys::{console, window, Storage};

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

impl Session {
    pub fn new(token: String, user_id: Uuid) -> Self {
        Self { token, user_id }
    }

    /// Both keys must be present and the id must parse.
    pub fn from_parts(token: Option<String>, user_id: Option<String>) -> Option<Self> {
        let token = token.filter(|t| !t.trim().is_empty())?;
        let user_id = Uuid::parse_str(user_id?.trim()).ok()?;
        Some(Self { token, user_id })
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn load() -> Option<Self> {
        let storage = storage()?;
        Self::from_parts(
            storage.get_item(TOKEN_KEY).ok().flatten(),
            storage.get_item(USER_ID_KEY).ok().flatten(),
        )
    }

    pub fn save(&self) {
        let Some(storage) = storage() else {
            console::error_1(&"localStorage unavailable, session not persisted".into());
            return;
        };
        let saved = storage
            .set_item(TOKEN_KEY, &self.token)
            .and_then(|_| storage.set_item(USER_ID_KEY, &self.user_id.to_string()));
        if saved.is_err() {
            console::error_1(&"Failed to persist session".into());
        }
    }

    pub fn clear() {
        if let Some(storage) = storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_ID_KEY);
        }
    }
}

fn storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}
