//! The browser surface the version guard depends on.

use super::types::{FetchError, PlatformError};
use crate::storage::{KeyValueStore, StorageError};
use std::future::Future;
use std::time::Duration;

/// Browser capabilities used by `VersionGuard`.
///
/// The WASM build implements this with `web-sys` (`WebBrowser`); tests
/// substitute an in-memory fake. Async methods return plain futures without
/// `Send` bounds since everything runs on the single browser thread.
pub trait Browser {
    /// The origin's persistent storage (`localStorage`).
    fn local_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError>;

    /// The tab's session-scoped storage (`sessionStorage`).
    fn session_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError>;

    /// Names of every Cache Storage cache.
    ///
    /// Returns `PlatformError::Unsupported` when the Cache API is absent.
    fn cache_names(&self) -> impl Future<Output = Result<Vec<String>, PlatformError>>;

    /// Deletes one Cache Storage cache. Returns whether it existed.
    fn delete_cache(&self, name: &str) -> impl Future<Output = Result<bool, PlatformError>>;

    /// Unregisters every service worker registration for this origin and
    /// returns how many were removed.
    ///
    /// Returns `PlatformError::Unsupported` when service workers are absent.
    fn unregister_service_workers(&self) -> impl Future<Output = Result<usize, PlatformError>>;

    /// GETs `url` bypassing HTTP and service worker caches, returning the
    /// body of a 2xx response.
    fn fetch_text(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, FetchError>>;

    /// Performs a full document navigation to `url`.
    fn navigate(&self, url: &str) -> Result<(), PlatformError>;

    /// Performs a full document reload.
    fn reload(&self) -> Result<(), PlatformError>;

    /// Current wall-clock time in milliseconds, used for cache busting and
    /// as the reentrancy flag value.
    fn now_millis(&self) -> i64;
}

/// Largest delay `setTimeout` accepts; longer delays fire immediately.
const MAX_TIMER_DELAY_MS: u128 = i32::MAX as u128;

/// Converts a timeout to a `setTimeout` delay, clamped so it cannot
/// overflow into an immediate expiry.
pub fn timer_delay_millis(timeout: Duration) -> i32 {
    timeout.as_millis().min(MAX_TIMER_DELAY_MS) as i32
}

/// Appends `param=stamp` to `url`, keeping any fragment at the end.
pub fn cache_busted(url: &str, param: &str, stamp: i64) -> String {
    let (base, fragment) = match url.find('#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    format!("{}{}{}={}{}", base, separator, param, stamp, fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_delay_is_clamped() {
        assert_eq!(timer_delay_millis(Duration::from_secs(5)), 5000);
        assert_eq!(timer_delay_millis(Duration::from_micros(1500)), 1);
        assert_eq!(timer_delay_millis(Duration::from_secs(u64::MAX)), i32::MAX);
    }

    #[test]
    fn test_cache_busted_urls() {
        assert_eq!(
            cache_busted("/version.json", "v", 1700000000000),
            "/version.json?v=1700000000000"
        );
        assert_eq!(cache_busted("/admin?tab=loans", "v", 5), "/admin?tab=loans&v=5");
        assert_eq!(cache_busted("/admin?", "v", 5), "/admin?v=5");
        assert_eq!(cache_busted("/admin#books", "v", 5), "/admin?v=5#books");
        assert_eq!(
            cache_busted("https://example.org/a?b=1#c", "t", 9),
            "https://example.org/a?b=1&t=9#c"
        );
    }
}
