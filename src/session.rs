//! Signed-in admin session.
//!
//! The logged-in admin record lives in local storage next to the auth
//! client's token entries; both are on the guard's preserved list so an
//! update wipe does not sign anyone out.

use crate::audit::{AuditLogger, AuditSink};
use crate::storage::{load_json, save_json, KeyValueStore, StorageError};
use crate::version_guard::{Browser, VersionGuard, AUTH_TOKEN_PREFIX, USER_RECORD_KEY};
use serde::{Deserialize, Serialize};

/// Permission level of an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Manages every library in the network.
    NetworkAdmin,
    /// Manages a single library.
    LibraryAdmin,
    Librarian,
}

impl AdminRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NetworkAdmin => "Network admin",
            Self::LibraryAdmin => "Library admin",
            Self::Librarian => "Librarian",
        }
    }
}

/// The logged-in user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: AdminRole,
    #[serde(default)]
    pub library_id: Option<String>,
}

/// Persists the admin record in a `KeyValueStore`.
pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, user: &AdminUser) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), USER_RECORD_KEY, user)
    }

    /// Loads the record; a missing or corrupt record means signed out.
    pub fn load(&self) -> Option<AdminUser> {
        match load_json(self.store.as_ref(), USER_RECORD_KEY) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Discarding unreadable session record: {}", e);
                None
            }
        }
    }

    /// Access token from the auth client's `sb-*-auth-token` entry, if any.
    pub fn access_token(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct StoredToken {
            access_token: String,
        }

        let keys = self.store.keys().ok()?;
        keys.iter()
            .filter(|k| k.starts_with(AUTH_TOKEN_PREFIX) && k.ends_with("-auth-token"))
            .find_map(|k| load_json::<StoredToken>(self.store.as_ref(), k).ok().flatten())
            .map(|t| t.access_token)
    }

    /// Removes the admin record and every auth token entry.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_item(USER_RECORD_KEY)?;
        for key in self.store.keys()? {
            if key.starts_with(AUTH_TOKEN_PREFIX) {
                self.store.remove_item(&key)?;
            }
        }
        Ok(())
    }
}

/// Finishes a successful sign-in: stores the record, audits it, then wipes
/// stale caches and loads `destination` fresh.
pub async fn complete_login<B: Browser, S: AuditSink>(
    guard: &VersionGuard<B>,
    session: &SessionStore,
    audit: &mut AuditLogger<S>,
    user: &AdminUser,
    destination: Option<&str>,
) {
    if let Err(e) = session.save(user) {
        log::error!("Failed to persist session for {}: {}", user.email, e);
    }

    audit.set_user(Some(user.id.clone()));
    audit.log_login(&user.email).await;

    log::info!("Signed in as {} ({})", user.email, user.role.label());
    guard.clear_cache_and_redirect(destination).await;
}

/// Signs out: audits, drops the session, and navigates to `destination`.
pub async fn sign_out<B: Browser, S: AuditSink>(
    guard: &VersionGuard<B>,
    session: &SessionStore,
    audit: &mut AuditLogger<S>,
    destination: &str,
) {
    audit.log_logout().await;
    audit.set_user(None);

    if let Err(e) = session.clear() {
        log::error!("Failed to clear session: {}", e);
    }

    guard.clear_cache_and_redirect(Some(destination)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, MemorySink, AUDIT_TABLE};
    use crate::storage::MemoryStore;
    use crate::version_guard::testing::{FakeBrowser, FAKE_NOW};
    use crate::version_guard::GuardConfig;
    use pollster::block_on;

    fn user() -> AdminUser {
        AdminUser {
            id: "u-1".to_string(),
            email: "head@central.example.org".to_string(),
            full_name: "Head Librarian".to_string(),
            role: AdminRole::LibraryAdmin,
            library_id: Some("lib-1".to_string()),
        }
    }

    #[test]
    fn test_save_load_clear() {
        let store = MemoryStore::with_entries([("sb-proj-auth-token", "{}"), ("cart", "abc")]);
        let session = SessionStore::new(Box::new(store.clone()));

        assert_eq!(session.load(), None);
        session.save(&user()).unwrap();
        assert_eq!(session.load(), Some(user()));

        session.clear().unwrap();
        assert_eq!(session.load(), None);
        assert_eq!(store.keys().unwrap(), vec!["cart"]);
    }

    #[test]
    fn test_corrupt_record_means_signed_out() {
        let store = MemoryStore::with_entries([(USER_RECORD_KEY, "{\"id\":")]);
        let session = SessionStore::new(Box::new(store));
        assert_eq!(session.load(), None);
    }

    #[test]
    fn test_access_token_lookup() {
        let store = MemoryStore::with_entries([
            ("sb-proj-auth-token", r#"{"access_token":"jwt-abc","refresh_token":"r"}"#),
            ("sb-proj-auth-token-code-verifier", "\"verifier\""),
        ]);
        let session = SessionStore::new(Box::new(store));
        assert_eq!(session.access_token(), Some("jwt-abc".to_string()));

        let empty = SessionStore::new(Box::new(MemoryStore::new()));
        assert_eq!(empty.access_token(), None);
    }

    #[test]
    fn test_complete_login_keeps_session_through_wipe() {
        let browser = FakeBrowser::serving("")
            .with_local([("sb-proj-auth-token", "{}"), ("stale_filters", "[]")])
            .with_caches(&["assets-v1"]);
        let local = browser.local.clone();
        let guard = VersionGuard::new(browser, GuardConfig::default());
        let session = SessionStore::new(Box::new(local.clone()));
        let mut audit = AuditLogger::new(MemorySink::new());

        block_on(complete_login(&guard, &session, &mut audit, &user(), None));

        assert_eq!(
            local.keys().unwrap(),
            vec![USER_RECORD_KEY, "sb-proj-auth-token"]
        );
        assert_eq!(session.load(), Some(user()));
        assert_eq!(audit.user_id(), Some("u-1"));

        let rows = audit.sink().recent_entries(10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, AuditAction::Login);

        assert_eq!(
            guard.browser().navigations.borrow().as_slice(),
            &[format!("/admin?v={}", FAKE_NOW)]
        );
    }

    #[test]
    fn test_sign_out() {
        let browser = FakeBrowser::serving("").with_local([("sb-proj-auth-token", "{}")]);
        let local = browser.local.clone();
        let guard = VersionGuard::new(browser, GuardConfig::default());
        let session = SessionStore::new(Box::new(local.clone()));
        session.save(&user()).unwrap();
        let mut audit = AuditLogger::new(MemorySink::new());
        audit.set_user(Some("u-1".to_string()));

        block_on(sign_out(&guard, &session, &mut audit, "/login"));

        assert!(local.is_empty());
        assert_eq!(audit.user_id(), None);
        let rows = audit.sink().rows(AUDIT_TABLE);
        assert_eq!(rows[0]["action"], "logout");
        assert_eq!(rows[0]["user_id"], "u-1");
        assert_eq!(
            guard.browser().navigations.borrow().as_slice(),
            &[format!("/login?v={}", FAKE_NOW)]
        );
    }
}
