#![warn(clippy::all)]

//! Library Admin - client core for the library network dashboard.
//!
//! The dashboard runs in the browser; this library holds everything that is
//! not drawing:
//! - `version_guard`: detects stale bundles and wipes caches before reloading
//! - `storage`: local/session storage behind a common trait
//! - `script_loader`: one-time external script injection
//! - `audit`: audit trail rows and their insert sink
//! - `session`: the signed-in admin record and login/logout flows
//! - `notifications`, `theme`: header popover and color settings

pub mod audit;
pub mod notifications;
pub mod script_loader;
pub mod session;
pub mod storage;
pub mod theme;
pub mod version_guard;
