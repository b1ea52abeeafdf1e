//! Session persistence
//!
//! This module keeps the last connected provider and address across reloads.
//! Both values live in one serialized record so they are written and cleared
//! together.

use crate::domain::entities::PersistedSession;
use crate::infrastructure::platform::PlatformStorage;
use crate::shared::constants::SESSION_KEY_SUFFIX;
use crate::shared::error::WalletError;
use std::sync::Arc;

pub struct SessionStore {
    storage: Arc<dyn PlatformStorage>,
    key: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn PlatformStorage>, namespace: &str) -> Self {
        Self {
            storage,
            key: format!("{}_{}", namespace, SESSION_KEY_SUFFIX),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, session: &PersistedSession) -> Result<(), WalletError> {
        let data = serde_json::to_vec(session)?;
        self.storage.store(&self.key, &data)?;
        log::debug!("Persisted {} session", session.provider_kind);
        Ok(())
    }

    /// Last persisted session. A missing or unreadable record yields `None`;
    /// an unreadable one is also removed.
    pub fn load(&self) -> Option<PersistedSession> {
        if !self.storage.exists(&self.key).unwrap_or(false) {
            return None;
        }

        let data = match self.storage.retrieve(&self.key) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Discarding corrupt persisted session: {}", e);
                if let Err(e) = self.storage.delete(&self.key) {
                    log::warn!("Failed to remove corrupt session record: {}", e);
                }
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), WalletError> {
        self.storage.delete(&self.key)
    }
}
