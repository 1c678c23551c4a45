//! Best-effort local persistence of the session and the last known position.
//!
//! Every operation on local storage goes through [`SessionStore`]. Failures
//! are logged and swallowed: losing the cache never interrupts a session.

pub mod models;

use std::sync::Arc;

use adapters::LocalStorage;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use models::{PersistedPosition, PersistedSession};

pub const SESSION_KEY: &str = "userSession";
pub const LAST_POSITION_KEY: &str = "lastPosition";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn save_session(&self, session: &PersistedSession) {
        self.save(SESSION_KEY, session);
    }

    pub fn load_session(&self) -> Option<PersistedSession> {
        self.load(SESSION_KEY)
    }

    pub fn save_last_position(&self, position: &PersistedPosition) {
        self.save(LAST_POSITION_KEY, position);
    }

    pub fn load_last_position(&self) -> Option<PersistedPosition> {
        self.load(LAST_POSITION_KEY)
    }

    /// Removes both persisted keys.
    pub fn clear_all(&self) {
        self.clear(SESSION_KEY);
        self.clear(LAST_POSITION_KEY);
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(Into::into)
            .and_then(|text| self.storage.set_item(key, &text));
        if let Err(err) = result {
            tracing::error!(key, error = %err, "failed to save to local storage");
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = match self.storage.get_item(key) {
            Ok(text) => text?,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to read from local storage");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(key, error = %err, "ignoring unreadable local storage entry");
                None
            }
        }
    }

    fn clear(&self, key: &str) {
        if let Err(err) = self.storage.remove_item(key) {
            tracing::error!(key, error = %err, "failed to clear local storage");
        }
    }
}
