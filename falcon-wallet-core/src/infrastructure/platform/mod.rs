//! Platform-specific implementations
//!
//! This module contains the durable key/value storage used by the session
//! store. A browser host backs it with local storage; native hosts use the
//! file backend rooted in the platform data directory.

use crate::shared::error::WalletError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Platform-specific storage implementation
pub trait PlatformStorage: Send + Sync {
    /// Store data under a key, replacing any previous value
    fn store(&self, key: &str, data: &[u8]) -> Result<(), WalletError>;

    /// Retrieve data
    fn retrieve(&self, key: &str) -> Result<Vec<u8>, WalletError>;

    /// Delete data. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), WalletError>;

    /// Check if data exists
    fn exists(&self, key: &str) -> Result<bool, WalletError>;

    /// List all stored keys
    fn list_keys(&self) -> Result<Vec<String>, WalletError>;
}

/// In-process storage, lost when the process exits
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, WalletError> {
        self.data
            .lock()
            .map_err(|e| WalletError::storage(format!("Storage lock poisoned: {}", e)))
    }
}

impl PlatformStorage for MemoryStorage {
    fn store(&self, key: &str, data: &[u8]) -> Result<(), WalletError> {
        self.lock()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Vec<u8>, WalletError> {
        self.lock()?
            .get(key)
            .cloned()
            .ok_or_else(|| WalletError::not_found(format!("Key not found: {}", key)))
    }

    fn delete(&self, key: &str) -> Result<(), WalletError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, WalletError> {
        Ok(self.lock()?.contains_key(key))
    }

    fn list_keys(&self) -> Result<Vec<String>, WalletError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// File storage in the OS data directory, one `.json` file per key
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Storage under `<data_dir>/<namespace>`
    pub fn new(namespace: &str) -> Result<Self, WalletError> {
        let base_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("./storage"));
        Self::with_root(base_dir.join(namespace))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self, WalletError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("File storage rooted at {}", root.display());
        Ok(Self { root })
    }

    // Keys become file names; anything outside [A-Za-z0-9_-] is replaced
    fn file_path(&self, key: &str) -> Result<PathBuf, WalletError> {
        if key.is_empty() {
            return Err(WalletError::validation("Storage key cannot be empty"));
        }
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        Ok(self.root.join(format!("{}.json", name)))
    }
}

impl PlatformStorage for FileStorage {
    fn store(&self, key: &str, data: &[u8]) -> Result<(), WalletError> {
        let path = self.file_path(key)?;
        // Write then rename so readers never see a half-written record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Vec<u8>, WalletError> {
        let path = self.file_path(key)?;
        if !path.exists() {
            return Err(WalletError::not_found(format!("Key not found: {}", key)));
        }
        Ok(fs::read(path)?)
    }

    fn delete(&self, key: &str) -> Result<(), WalletError> {
        let path = self.file_path(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, WalletError> {
        Ok(self.file_path(key)?.exists())
    }

    fn list_keys(&self) -> Result<Vec<String>, WalletError> {
        let mut keys = vec![];
        for entry in fs::read_dir(&self.root)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }
}
