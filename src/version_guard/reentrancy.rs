//! Session-scoped reentrancy flag.
//!
//! The flag must survive the forced reload it guards, so it lives in session
//! storage rather than memory. It is consumed by the first check after the
//! reload (read-then-delete) and never left to expire on its own.

use crate::storage::{KeyValueStore, StorageError};

/// Read-then-delete marker over a `KeyValueStore`.
pub struct ReentrancyGuard<'a> {
    store: &'a dyn KeyValueStore,
    key: &'a str,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn new(store: &'a dyn KeyValueStore, key: &'a str) -> Self {
        Self { store, key }
    }

    /// Consumes the flag. Returns true if it was set.
    ///
    /// An unreadable store counts as "not set" so the check proceeds.
    pub fn take(&self) -> bool {
        match self.store.get_item(self.key) {
            Ok(Some(_)) => {
                if let Err(e) = self.store.remove_item(self.key) {
                    log::warn!("Failed to clear reentrancy flag {}: {}", self.key, e);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Failed to read reentrancy flag {}: {}", self.key, e);
                false
            }
        }
    }

    /// Sets the flag, recording when it was armed.
    pub fn arm(&self, stamp: i64) -> Result<(), StorageError> {
        self.store.set_item(self.key, &stamp.to_string())
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.store.get_item(self.key), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_take_consumes_flag() {
        let store = MemoryStore::new();
        let guard = ReentrancyGuard::new(&store, "version_just_checked");

        assert!(!guard.take());

        guard.arm(42).unwrap();
        assert!(guard.is_armed());
        assert_eq!(
            store.get_item("version_just_checked").unwrap(),
            Some("42".to_string())
        );

        assert!(guard.take());
        assert!(!guard.is_armed());
        assert!(!guard.take());
    }
}
