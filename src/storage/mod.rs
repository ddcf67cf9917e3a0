//! Generic storage abstraction for persisted client state.
//!
//! This module provides a platform-agnostic interface for string key-value
//! storage. On WASM targets, `BrowserStorage` wraps the browser's
//! `localStorage` and `sessionStorage`. `MemoryStore` is available on every
//! target and backs tests and environments without a window.

#[cfg(target_arch = "wasm32")]
mod web_storage;

#[cfg(target_arch = "wasm32")]
pub use web_storage::BrowserStorage;

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage area does not exist in this runtime (no window, disabled
    /// by the user agent, private browsing restrictions).
    Unavailable(String),
    /// A read, write, or clear call was rejected.
    OperationFailed(String),
    /// Serialization or deserialization failed.
    SerializationError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::OperationFailed(msg) => write!(f, "Storage operation failed: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A synchronous string key-value storage interface.
///
/// Mirrors the Web Storage API so that `localStorage`, `sessionStorage` and
/// in-memory stores are interchangeable. The trait is object safe; callers
/// usually hold a `Box<dyn KeyValueStore>`.
///
/// Note: This trait does not require `Send` bounds since WASM is single-threaded
/// and JS types cannot be sent between threads.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `Ok(None)` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Returns `Ok(())` even if the key didn't exist.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently in the store.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Removes all entries from the store.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Reads a JSON-encoded record stored under `key`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_item(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::SerializationError(e.to_string())),
        None => Ok(None),
    }
}

/// Writes `value` as JSON under `key`.
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json =
        serde_json::to_string(value).map_err(|e| StorageError::SerializationError(e.to_string()))?;
    store.set_item(key, &json)
}

/// A simple in-memory store.
///
/// Clones share the same underlying map, so a clone handed to a component
/// observes every write made through the original. Keys are kept sorted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns a copy of all entries.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data.read().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data
            .write()
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.data
            .write()
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        Ok(data.keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.data
            .write()
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn test_memory_store_clones_share_data() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set_item("a", "1").unwrap();
        assert_eq!(other.get_item("a").unwrap(), Some("1".to_string()));

        other.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
        // Removing a missing key is not an error
        other.remove_item("a").unwrap();
    }

    #[test]
    fn test_memory_store_keys_and_clear() {
        let store = MemoryStore::with_entries([("b", "2"), ("a", "1")]);
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        let record = Record {
            name: "Central Branch".to_string(),
            count: 3,
        };

        save_json(&store, "record", &record).unwrap();
        let loaded: Option<Record> = load_json(&store, "record").unwrap();
        assert_eq!(loaded, Some(record));

        let missing: Option<Record> = load_json(&store, "missing").unwrap();
        assert_eq!(missing, None);

        store.set_item("broken", "{not json").unwrap();
        let broken: Result<Option<Record>, _> = load_json(&store, "broken");
        assert!(matches!(broken, Err(StorageError::SerializationError(_))));
    }
}
