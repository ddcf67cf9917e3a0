//! Async channel for version checks and cache-clearing navigations.
//!
//! The guard's operations are async but egui's update() is synchronous.
//! The UI requests an operation and polls for its outcome each frame.

use crate::AppAuditSink;
use eframe::egui::Context;
use library_admin::audit::AuditLogger;
use library_admin::session::{self, SessionStore};
use library_admin::storage::BrowserStorage;
use library_admin::version_guard::{CheckOutcome, VersionGuard, WebBrowser};
use std::cell::RefCell;
use std::rc::Rc;

/// Page the app lands on after signing out.
const SIGNED_OUT_DESTINATION: &str = "/login";

pub struct UpdateChannel {
    /// Receiver for a completed version check
    receiver: Rc<RefCell<Option<CheckOutcome>>>,
    /// Flag indicating an operation is in progress
    busy: Rc<RefCell<bool>>,
}

impl UpdateChannel {
    pub fn new() -> Self {
        Self {
            receiver: Rc::new(RefCell::new(None)),
            busy: Rc::new(RefCell::new(false)),
        }
    }

    /// Returns true if a check or navigation is in progress.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Starts a version check.
    ///
    /// If an operation is already in progress, this call is ignored.
    /// The outcome can be retrieved via `try_recv()`.
    pub fn check(&self, ctx: Context, guard: Rc<VersionGuard<WebBrowser>>) {
        if !self.begin("version check") {
            return;
        }

        let receiver = self.receiver.clone();
        let busy = self.busy.clone();

        wasm_bindgen_futures::spawn_local(async move {
            log::info!("Checking for a newer deployment...");
            let outcome = guard.check_version_and_update().await;
            log::info!("Version check: {}", outcome.label());

            *receiver.borrow_mut() = Some(outcome);
            *busy.borrow_mut() = false;

            // Request a repaint to process the result
            ctx.request_repaint();
        });
    }

    /// Wipes caches (keeping the session) and navigates to `destination`.
    pub fn clear_and_redirect(
        &self,
        guard: Rc<VersionGuard<WebBrowser>>,
        destination: Option<String>,
    ) {
        if !self.begin("cache clear") {
            return;
        }

        // Stays busy: the page is navigating away.
        wasm_bindgen_futures::spawn_local(async move {
            log::info!("Clearing caches and reloading...");
            guard.clear_cache_and_redirect(destination.as_deref()).await;
        });
    }

    /// Signs out, wipes caches, and navigates to the login page.
    pub fn sign_out(
        &self,
        guard: Rc<VersionGuard<WebBrowser>>,
        mut audit: AuditLogger<AppAuditSink>,
    ) {
        if !self.begin("sign out") {
            return;
        }

        wasm_bindgen_futures::spawn_local(async move {
            match BrowserStorage::local() {
                Ok(local) => {
                    let store = SessionStore::new(Box::new(local));
                    session::sign_out(&guard, &store, &mut audit, SIGNED_OUT_DESTINATION).await;
                }
                Err(e) => {
                    log::error!("Cannot sign out without local storage: {}", e);
                    guard
                        .clear_cache_and_redirect(Some(SIGNED_OUT_DESTINATION))
                        .await;
                }
            }
        });
    }

    /// Non-blocking receive for the version check outcome.
    pub fn try_recv(&self) -> Option<CheckOutcome> {
        self.receiver.borrow_mut().take()
    }

    fn begin(&self, operation: &str) -> bool {
        if *self.busy.borrow() {
            log::debug!("Operation in progress, ignoring {} request", operation);
            return false;
        }
        *self.busy.borrow_mut() = true;
        true
    }
}

impl Default for UpdateChannel {
    fn default() -> Self {
        Self::new()
    }
}
