//! Configuration for the version guard.

use std::time::Duration;

/// Build identifier baked into this client bundle.
///
/// The deployment pipeline sets `LIBRARY_ADMIN_BUILD_VERSION` to the same
/// value it writes into `version.json`; local builds fall back to the crate
/// version.
pub const EMBEDDED_VERSION: &str = match option_env!("LIBRARY_ADMIN_BUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Local-storage key prefix used by the hosted database's auth client for
/// session tokens (e.g. `sb-<project>-auth-token`).
pub const AUTH_TOKEN_PREFIX: &str = "sb-";

/// Local-storage key holding the logged-in admin record.
pub const USER_RECORD_KEY: &str = "library_admin_user";

/// Settings for version checks and cache wipes.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Path of the server-published version descriptor.
    pub version_url: String,
    /// Session-storage key of the reentrancy flag.
    pub guard_key: String,
    /// Upper bound on the version fetch before failing open.
    pub fetch_timeout: Duration,
    /// Navigation target for `clear_cache_and_redirect` when none is given.
    pub default_redirect: String,
    /// Query parameter name used to defeat intermediate caches.
    pub cache_bust_param: String,
    /// Local-storage rules that survive a version-triggered wipe.
    pub preserved_keys: Vec<String>,
    /// Local-storage rules that always survive a post-login wipe.
    pub auth_keys: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        let auth_keys = vec![AUTH_TOKEN_PREFIX.to_string(), USER_RECORD_KEY.to_string()];
        Self {
            version_url: "/version.json".to_string(),
            guard_key: "version_just_checked".to_string(),
            fetch_timeout: Duration::from_secs(5),
            default_redirect: "/admin".to_string(),
            cache_bust_param: "v".to_string(),
            preserved_keys: auth_keys.clone(),
            auth_keys,
        }
    }
}

impl GuardConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the version descriptor URL.
    pub fn with_version_url(mut self, url: impl Into<String>) -> Self {
        self.version_url = url.into();
        self
    }

    /// Sets the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the default redirect destination.
    pub fn with_default_redirect(mut self, destination: impl Into<String>) -> Self {
        self.default_redirect = destination.into();
        self
    }

    /// Replaces the rules preserved by version-triggered wipes.
    pub fn with_preserved_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Applies deployment overrides (as read from `LIBRARY_ADMIN_VERSION_URL`,
    /// `LIBRARY_ADMIN_FETCH_TIMEOUT_MS` and `LIBRARY_ADMIN_DEFAULT_REDIRECT`).
    ///
    /// Empty values are ignored; an unparsable timeout keeps the current one.
    pub fn with_overrides(
        mut self,
        version_url: Option<&str>,
        fetch_timeout_ms: Option<&str>,
        default_redirect: Option<&str>,
    ) -> Self {
        if let Some(url) = version_url.filter(|u| !u.is_empty()) {
            self = self.with_version_url(url);
        }

        if let Some(raw) = fetch_timeout_ms.filter(|t| !t.is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => {
                    self = self.with_fetch_timeout(Duration::from_millis(millis));
                }
                _ => log::warn!(
                    "Ignoring invalid fetch timeout {:?}, keeping {:?}",
                    raw,
                    self.fetch_timeout
                ),
            }
        }

        if let Some(destination) = default_redirect.filter(|d| !d.is_empty()) {
            self = self.with_default_redirect(destination);
        }

        self
    }

    /// Rules preserved by `clear_cache_and_redirect`: the auth keys plus the
    /// configured preserved keys, without duplicates.
    pub fn redirect_preserved_keys(&self) -> Vec<String> {
        let mut keys = self.auth_keys.clone();
        for key in &self.preserved_keys {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preserves_auth_keys() {
        let config = GuardConfig::default();
        assert_eq!(config.preserved_keys, vec!["sb-", "library_admin_user"]);
        assert_eq!(config.redirect_preserved_keys(), config.auth_keys);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_redirect_keys_merge_without_duplicates() {
        let config = GuardConfig::new().with_preserved_keys(["sb-", "theme"]);
        assert_eq!(
            config.redirect_preserved_keys(),
            vec!["sb-", "library_admin_user", "theme"]
        );
    }

    #[test]
    fn test_overrides() {
        let config = GuardConfig::default().with_overrides(
            Some("/static/version.json"),
            Some("2500"),
            Some("/admin/dashboard"),
        );
        assert_eq!(config.version_url, "/static/version.json");
        assert_eq!(config.fetch_timeout, Duration::from_millis(2500));
        assert_eq!(config.default_redirect, "/admin/dashboard");

        let config = GuardConfig::default().with_overrides(Some(""), Some("soon"), None);
        assert_eq!(config.version_url, "/version.json");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.default_redirect, "/admin");

        let config = GuardConfig::default().with_overrides(None, Some("0"), Some(""));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.default_redirect, "/admin");
    }

    #[test]
    fn test_embedded_version_is_set() {
        assert!(!EMBEDDED_VERSION.is_empty());
    }
}
