//! Web Storage implementation for WASM targets.
//!
//! Wraps `window.localStorage` / `window.sessionStorage` behind the
//! `KeyValueStore` trait.

use super::{KeyValueStore, StorageError};

/// A `localStorage` or `sessionStorage` area.
#[derive(Clone)]
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    /// Opens the origin's `localStorage`.
    pub fn local() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))?;

        Ok(Self { storage })
    }

    /// Opens the tab's `sessionStorage`.
    pub fn session() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;

        let storage = window
            .session_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| {
                StorageError::Unavailable("sessionStorage not available".to_string())
            })?;

        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::OperationFailed(format!("{:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::OperationFailed(format!("{:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::OperationFailed(format!("{:?}", e)))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let length = self
            .storage
            .length()
            .map_err(|e| StorageError::OperationFailed(format!("{:?}", e)))?;

        let mut keys = Vec::with_capacity(length as usize);
        for i in 0..length {
            if let Ok(Some(key)) = self.storage.key(i) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.storage
            .clear()
            .map_err(|e| StorageError::OperationFailed(format!("{:?}", e)))
    }
}
