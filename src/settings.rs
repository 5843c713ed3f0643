//! Persisted local settings
//!
//! The actual persistence layer is an external collaborator; the core
//! reads and writes through this seam. [`MemorySettings`] is a
//! non-persistent implementation for tests and embedding defaults.

use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known settings keys
pub mod keys {
    /// Device access token for the cloud account
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// Cloud user identity
    pub const USER_ID: &str = "userId";
    /// Cloud endpoint URL
    pub const CLOUD_CORE_URL: &str = "cloudCoreUrl";
    /// Player display name
    pub const PLAYER_NAME: &str = "playerName";
    /// Player model identifier
    pub const PLAYER_MODEL: &str = "playerModel";
}

/// Key-value store of local settings
pub trait SettingsStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str);

    /// Remove a value
    fn remove(&self, key: &str);

    /// The stored device access token, if any
    fn access_token(&self) -> Option<String> {
        self.get(keys::ACCESS_TOKEN)
    }

    /// Check whether a device access token is stored
    fn has_access_token(&self) -> bool {
        self.access_token().is_some()
    }

    /// Drop the stored access token and the user id tied to it
    fn clear_access_token(&self) {
        self.remove(keys::ACCESS_TOKEN);
        self.remove(keys::USER_ID);
    }

    /// Store the cloud endpoint URL, invalidating credentials bound to
    /// the previous endpoint when the URL actually changes
    fn set_cloud_core_url(&self, url: &str) {
        let previous = self.get(keys::CLOUD_CORE_URL);
        if previous.as_deref() != Some(url) {
            self.clear_access_token();
            self.set(keys::CLOUD_CORE_URL, url);
        }
    }
}

/// In-memory, non-persistent settings store
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}
