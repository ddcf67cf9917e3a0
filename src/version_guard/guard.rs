//! Stale-client detection and recovery.

use super::browser::{cache_busted, Browser};
use super::config::{GuardConfig, EMBEDDED_VERSION};
use super::reentrancy::ReentrancyGuard;
use super::types::{
    CheckOutcome, PlatformError, PreservedKeys, RemoteVersionDescriptor, StepStatus, WipeReport,
};
use crate::storage::{KeyValueStore, StorageError};

/// Compares the embedded build version against the deployed one and, when
/// they differ, wipes client caches and forces a reload.
///
/// Every browser interaction is best-effort: failures are logged and never
/// surface to the caller. Call `check_version_and_update` once per page
/// lifetime (at app mount or right after login).
pub struct VersionGuard<B: Browser> {
    browser: B,
    config: GuardConfig,
    embedded_version: String,
}

impl<B: Browser> VersionGuard<B> {
    /// Creates a guard for this build's `EMBEDDED_VERSION`.
    pub fn new(browser: B, config: GuardConfig) -> Self {
        Self {
            browser,
            config,
            embedded_version: EMBEDDED_VERSION.to_string(),
        }
    }

    /// Overrides the embedded version.
    pub fn with_embedded_version(mut self, version: impl Into<String>) -> Self {
        self.embedded_version = version.into();
        self
    }

    pub fn embedded_version(&self) -> &str {
        &self.embedded_version
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Runs one version check.
    ///
    /// 1. If the reentrancy flag is set, consume it and skip.
    /// 2. Fetch the remote descriptor; any failure counts as up to date.
    /// 3. On mismatch, confirm the flag can be set, wipe caches, arm the
    ///    flag, and reload. An unusable flag fails open before the wipe.
    pub async fn check_version_and_update(&self) -> CheckOutcome {
        if self.take_guard_flag() {
            log::info!("Skipping version check: page was just reloaded by an update");
            return CheckOutcome::SkippedRecentCheck;
        }

        let Some(remote_version) = self.fetch_remote_version().await else {
            return CheckOutcome::UpToDate;
        };

        if remote_version == self.embedded_version {
            log::info!("Client version {} is current", self.embedded_version);
            return CheckOutcome::UpToDate;
        }

        log::info!(
            "New version deployed: running {}, server has {}",
            self.embedded_version,
            remote_version
        );

        // Without a working flag a persistent mismatch would wipe on every
        // mount, so the flag must stick before anything is touched.
        if let Err(e) = self.arm_guard_flag() {
            log::error!("Reentrancy flag unusable, not updating: {}", e);
            return CheckOutcome::UpToDate;
        }

        let report = self.clear_all_caches(&self.config.preserved_keys).await;
        if !report.is_clean() {
            log::warn!("Cache wipe finished with failures: {:?}", report);
        }

        // The wipe empties session storage, so the flag is armed again.
        if let Err(e) = self.arm_guard_flag() {
            log::error!("Failed to set reentrancy flag, not reloading: {}", e);
            return CheckOutcome::UpToDate;
        }

        if let Err(e) = self.browser.reload() {
            log::error!("Failed to reload page: {}", e);
        }

        CheckOutcome::UpdatedAndReloading
    }

    /// Fetches `version.json` and returns its `version` field.
    ///
    /// Network errors, timeouts, non-2xx statuses, malformed JSON and a
    /// missing field all yield `None`.
    pub async fn fetch_remote_version(&self) -> Option<String> {
        let url = cache_busted(
            &self.config.version_url,
            &self.config.cache_bust_param,
            self.browser.now_millis(),
        );

        let body = match self
            .browser
            .fetch_text(&url, self.config.fetch_timeout)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Could not determine remote version: {}", e);
                return None;
            }
        };

        match RemoteVersionDescriptor::from_json(&body) {
            Ok(RemoteVersionDescriptor {
                version: Some(version),
            }) => Some(version),
            Ok(_) => {
                log::warn!("Could not determine remote version: no version field");
                None
            }
            Err(e) => {
                log::warn!("Could not determine remote version: {}", e);
                None
            }
        }
    }

    /// Wipes all persisted client state except local-storage entries whose
    /// key matches `preserve_keys`.
    ///
    /// Steps run in order and independently: Cache Storage, service workers,
    /// snapshot of preserved keys, clear local and session storage, restore.
    pub async fn clear_all_caches(&self, preserve_keys: &[String]) -> WipeReport {
        let preserved = PreservedKeys::new(preserve_keys.iter().cloned());
        log::debug!("Wiping client caches, preserving {:?}", preserved.rules());

        let cache_storage = self.delete_cache_storage().await;
        let service_workers = self.unregister_service_workers().await;

        let local = self.browser.local_storage();
        if let Err(e) = &local {
            log::warn!("Local storage unavailable during wipe: {}", e);
        }

        let (snapshot, saved) = match &local {
            Ok(store) => snapshot_preserved(store.as_ref(), &preserved),
            Err(e) => (storage_status(e), Vec::new()),
        };

        let local_clear = match &local {
            Ok(store) => clear_store(store.as_ref(), "local"),
            Err(e) => storage_status(e),
        };

        let session_clear = match self.browser.session_storage() {
            Ok(store) => clear_store(store.as_ref(), "session"),
            Err(e) => {
                log::warn!("Session storage unavailable during wipe: {}", e);
                storage_status(&e)
            }
        };

        let restore = match &local {
            Ok(store) => restore_snapshot(store.as_ref(), &saved),
            Err(e) => storage_status(e),
        };

        let report = WipeReport {
            cache_storage,
            service_workers,
            snapshot,
            local_clear,
            session_clear,
            restore,
        };
        log::info!("Client caches wiped: {:?}", report);
        report
    }

    /// Wipes caches (always keeping the auth session) and navigates to
    /// `destination`, or the configured default, with a cache-busting
    /// parameter. Used right after login.
    pub async fn clear_cache_and_redirect(&self, destination: Option<&str>) {
        let keys = self.config.redirect_preserved_keys();
        let report = self.clear_all_caches(&keys).await;
        if !report.is_clean() {
            log::warn!("Cache wipe before redirect had failures: {:?}", report);
        }

        let target = destination
            .filter(|d| !d.is_empty())
            .unwrap_or(self.config.default_redirect.as_str());
        let url = cache_busted(
            target,
            &self.config.cache_bust_param,
            self.browser.now_millis(),
        );

        log::info!("Redirecting to {}", url);
        if let Err(e) = self.browser.navigate(&url) {
            log::error!("Failed to navigate to {}: {}", url, e);
        }
    }

    fn take_guard_flag(&self) -> bool {
        match self.browser.session_storage() {
            Ok(store) => ReentrancyGuard::new(store.as_ref(), &self.config.guard_key).take(),
            Err(e) => {
                log::warn!("Session storage unavailable, cannot read reentrancy flag: {}", e);
                false
            }
        }
    }

    fn arm_guard_flag(&self) -> Result<(), StorageError> {
        let store = self.browser.session_storage()?;
        let flag = ReentrancyGuard::new(store.as_ref(), &self.config.guard_key);
        flag.arm(self.browser.now_millis())?;
        if !flag.is_armed() {
            return Err(StorageError::OperationFailed(format!(
                "{} did not persist",
                self.config.guard_key
            )));
        }
        Ok(())
    }

    async fn delete_cache_storage(&self) -> StepStatus {
        let names = match self.browser.cache_names().await {
            Ok(names) => names,
            Err(e) => return platform_status(&e),
        };

        let mut deleted = 0;
        let mut failures = Vec::new();

        for name in &names {
            match self.browser.delete_cache(name).await {
                Ok(true) => deleted += 1,
                Ok(false) => log::debug!("Cache {} was already gone", name),
                Err(e) => {
                    log::warn!("Failed to delete cache {}: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        if failures.is_empty() {
            StepStatus::Done(deleted)
        } else {
            StepStatus::Failed(failures.join("; "))
        }
    }

    async fn unregister_service_workers(&self) -> StepStatus {
        match self.browser.unregister_service_workers().await {
            Ok(count) => StepStatus::Done(count),
            Err(e) => platform_status(&e),
        }
    }
}

fn platform_status(error: &PlatformError) -> StepStatus {
    match error {
        PlatformError::Unsupported(api) => {
            log::debug!("{} not supported, skipping", api);
            StepStatus::Unsupported
        }
        PlatformError::Failed(msg) => {
            log::warn!("Browser cache cleanup failed: {}", msg);
            StepStatus::Failed(msg.clone())
        }
    }
}

fn storage_status(error: &StorageError) -> StepStatus {
    match error {
        StorageError::Unavailable(_) => StepStatus::Unsupported,
        other => StepStatus::Failed(other.to_string()),
    }
}

/// Captures every entry whose key is preserved.
fn snapshot_preserved(
    store: &dyn KeyValueStore,
    preserved: &PreservedKeys,
) -> (StepStatus, Vec<(String, String)>) {
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(e) => {
            log::warn!("Failed to enumerate local storage: {}", e);
            return (StepStatus::Failed(e.to_string()), Vec::new());
        }
    };

    let mut saved = Vec::new();
    let mut failures = Vec::new();

    for key in keys.into_iter().filter(|k| preserved.matches(k)) {
        match store.get_item(&key) {
            Ok(Some(value)) => saved.push((key, value)),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Failed to read preserved key {}: {}", key, e);
                failures.push(format!("{}: {}", key, e));
            }
        }
    }

    let status = if failures.is_empty() {
        StepStatus::Done(saved.len())
    } else {
        StepStatus::Failed(failures.join("; "))
    };
    (status, saved)
}

fn clear_store(store: &dyn KeyValueStore, area: &str) -> StepStatus {
    let count = store.keys().map(|keys| keys.len()).unwrap_or(0);
    match store.clear() {
        Ok(()) => StepStatus::Done(count),
        Err(e) => {
            log::warn!("Failed to clear {} storage: {}", area, e);
            StepStatus::Failed(e.to_string())
        }
    }
}

/// Writes the snapshot back and reads each entry again to confirm it stuck.
fn restore_snapshot(store: &dyn KeyValueStore, saved: &[(String, String)]) -> StepStatus {
    let mut restored = 0;
    let mut failures = Vec::new();

    for (key, value) in saved {
        if let Err(e) = store.set_item(key, value) {
            log::warn!("Failed to restore preserved key {}: {}", key, e);
            failures.push(format!("{}: {}", key, e));
            continue;
        }

        match store.get_item(key) {
            Ok(Some(current)) if &current == value => restored += 1,
            Ok(_) => {
                log::warn!("Preserved key {} did not survive the wipe", key);
                failures.push(format!("{}: not restored", key));
            }
            Err(e) => {
                log::warn!("Failed to verify preserved key {}: {}", key, e);
                failures.push(format!("{}: {}", key, e));
            }
        }
    }

    if failures.is_empty() {
        StepStatus::Done(restored)
    } else {
        StepStatus::Failed(failures.join("; "))
    }
}
