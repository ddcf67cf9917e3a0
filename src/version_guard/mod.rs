//! Stale-client cache invalidation and forced reload.
//!
//! Each deployment publishes `/version.json` and bakes the same identifier
//! into the client bundle. When a running client sees a different remote
//! version it wipes its caches and reloads so it picks up the new assets:
//!
//! ```text
//! mount / login
//!   └─ flag in sessionStorage? ── yes ─> consume flag, skip
//!        └─ no ─> GET /version.json?v=<now> (no-store, bounded)
//!                   ├─ error / no version ─> up to date (fail open)
//!                   ├─ same version ───────> up to date
//!                   └─ different ──────────> wipe caches (keep auth keys)
//!                                            set flag, full reload
//! ```
//!
//! ## Wipe steps
//! 1. Delete every Cache Storage cache
//! 2. Unregister every service worker
//! 3. Snapshot preserved local-storage entries
//! 4. Clear local and session storage
//! 5. Restore the snapshot
//!
//! Each step runs regardless of the others; `WipeReport` records how each
//! one went.

mod browser;
mod config;
mod guard;
mod reentrancy;
mod types;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{cache_busted, timer_delay_millis, Browser};
pub use config::{GuardConfig, AUTH_TOKEN_PREFIX, EMBEDDED_VERSION, USER_RECORD_KEY};
pub use guard::VersionGuard;
pub use reentrancy::ReentrancyGuard;
pub use types::{
    CheckOutcome, FetchError, PlatformError, PreservedKeys, RemoteVersionDescriptor, StepStatus,
    WipeReport,
};

#[cfg(target_arch = "wasm32")]
pub use web::WebBrowser;
