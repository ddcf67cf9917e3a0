//! In-memory `Browser` used by unit tests.

use super::browser::Browser;
use super::types::{FetchError, PlatformError};
use crate::storage::{KeyValueStore, MemoryStore, StorageError};
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub const FAKE_NOW: i64 = 1_700_000_000_000;

/// How the fake exposes a storage area.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Normal,
    Unavailable,
    /// Writes report success but are discarded.
    DropWrites,
}

pub struct FakeBrowser {
    pub local: MemoryStore,
    pub session: MemoryStore,
    pub local_mode: StoreMode,
    pub session_mode: StoreMode,
    pub cache_api: bool,
    pub worker_api: bool,
    pub caches: RefCell<Vec<String>>,
    /// Cache names whose deletion fails.
    pub broken_caches: Vec<String>,
    pub workers: Cell<usize>,
    pub response: RefCell<Result<String, FetchError>>,
    pub fetched_urls: RefCell<Vec<String>>,
    pub navigations: RefCell<Vec<String>>,
    pub reloads: Cell<usize>,
}

impl FakeBrowser {
    pub fn serving(body: &str) -> Self {
        Self {
            local: MemoryStore::new(),
            session: MemoryStore::new(),
            local_mode: StoreMode::Normal,
            session_mode: StoreMode::Normal,
            cache_api: true,
            worker_api: true,
            caches: RefCell::new(Vec::new()),
            broken_caches: Vec::new(),
            workers: Cell::new(0),
            response: RefCell::new(Ok(body.to_string())),
            fetched_urls: RefCell::new(Vec::new()),
            navigations: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        let browser = Self::serving("");
        *browser.response.borrow_mut() = Err(error);
        browser
    }

    pub fn with_local<K: Into<String>, V: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.local = MemoryStore::with_entries(entries);
        self
    }

    pub fn with_caches(self, names: &[&str]) -> Self {
        *self.caches.borrow_mut() = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_workers(self, count: usize) -> Self {
        self.workers.set(count);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched_urls.borrow().len()
    }
}

struct DroppingStore(MemoryStore);

impl KeyValueStore for DroppingStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get_item(key)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.0.keys()
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.0.clear()
    }
}

fn open(store: &MemoryStore, mode: StoreMode) -> Result<Box<dyn KeyValueStore>, StorageError> {
    match mode {
        StoreMode::Normal => Ok(Box::new(store.clone())),
        StoreMode::DropWrites => Ok(Box::new(DroppingStore(store.clone()))),
        StoreMode::Unavailable => Err(StorageError::Unavailable("disabled".to_string())),
    }
}

impl Browser for FakeBrowser {
    fn local_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        open(&self.local, self.local_mode)
    }

    fn session_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        open(&self.session, self.session_mode)
    }

    async fn cache_names(&self) -> Result<Vec<String>, PlatformError> {
        if !self.cache_api {
            return Err(PlatformError::Unsupported("CacheStorage"));
        }
        Ok(self.caches.borrow().clone())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PlatformError> {
        if self.broken_caches.iter().any(|n| n == name) {
            return Err(PlatformError::Failed("SecurityError".to_string()));
        }
        let mut caches = self.caches.borrow_mut();
        let before = caches.len();
        caches.retain(|n| n != name);
        Ok(caches.len() != before)
    }

    async fn unregister_service_workers(&self) -> Result<usize, PlatformError> {
        if !self.worker_api {
            return Err(PlatformError::Unsupported("ServiceWorkerContainer"));
        }
        Ok(self.workers.replace(0))
    }

    async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.fetched_urls.borrow_mut().push(url.to_string());
        self.response.borrow().clone()
    }

    fn navigate(&self, url: &str) -> Result<(), PlatformError> {
        self.navigations.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn reload(&self) -> Result<(), PlatformError> {
        self.reloads.set(self.reloads.get() + 1);
        Ok(())
    }

    fn now_millis(&self) -> i64 {
        FAKE_NOW
    }
}
