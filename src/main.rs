#![warn(clippy::all)]

//! Library Admin - the web dashboard for a library network.
//!
//! On startup the dashboard checks whether a newer deployment is live and,
//! if so, wipes its caches and reloads before the admin sees stale screens.

#[cfg(target_arch = "wasm32")]
mod state;
#[cfg(target_arch = "wasm32")]
mod ui;
#[cfg(target_arch = "wasm32")]
mod update_channel;

#[cfg(target_arch = "wasm32")]
use eframe::egui;
#[cfg(target_arch = "wasm32")]
use library_admin::audit::{AuditLogger, EntityKind, MemorySink, RestSink};
#[cfg(target_arch = "wasm32")]
use library_admin::notifications::NotificationKind;
#[cfg(target_arch = "wasm32")]
use library_admin::script_loader::{script_tag_loader, OnceLoader, ScriptLoadError};
#[cfg(target_arch = "wasm32")]
use library_admin::session::SessionStore;
#[cfg(target_arch = "wasm32")]
use library_admin::storage::BrowserStorage;
#[cfg(target_arch = "wasm32")]
use library_admin::theme::ThemeColors;
#[cfg(target_arch = "wasm32")]
use library_admin::version_guard::{
    CheckOutcome, GuardConfig, VersionGuard, WebBrowser, EMBEDDED_VERSION,
};
#[cfg(target_arch = "wasm32")]
use state::{AppState, PlacesStatus};
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use update_channel::UpdateChannel;

/// Audit rows go to memory for the in-app log and, when configured, to the
/// hosted database.
#[cfg(target_arch = "wasm32")]
pub type AppAuditSink = (MemorySink, Option<RestSink>);

/// Number of audit entries shown in the audit log section.
#[cfg(target_arch = "wasm32")]
const AUDIT_VIEW_LIMIT: usize = 100;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::error!(
        "library-admin runs in the browser; build it for wasm32-unknown-unknown and serve the bundle"
    );
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("app_canvas")
            .expect("Failed to find app_canvas")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("app_canvas was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(AdminApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
#[cfg(target_arch = "wasm32")]
pub struct AdminApp {
    /// Application state read and mutated by the UI panels
    state: AppState,

    /// Version check and cache-clear operations
    update_channel: UpdateChannel,

    /// Stale-client guard shared with async tasks
    guard: Rc<VersionGuard<WebBrowser>>,

    /// Audit trail for admin actions
    audit: AuditLogger<AppAuditSink>,

    /// In-memory copy of audit rows for the audit log section
    audit_memory: MemorySink,

    /// Row count of `audit_memory` when `recent_audit` was last refreshed
    audit_rows_seen: usize,

    /// Places autocomplete script, when configured
    places_loader: Option<OnceLoader>,

    /// Result of the places script load, set by its callback
    places_result: Rc<RefCell<Option<Result<(), ScriptLoadError>>>>,
}

#[cfg(target_arch = "wasm32")]
impl AdminApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let local = match BrowserStorage::local() {
            Ok(local) => Some(local),
            Err(e) => {
                log::warn!("localStorage unavailable: {}", e);
                None
            }
        };

        let theme = local
            .as_ref()
            .map(|store| ThemeColors::load(store))
            .unwrap_or_default();
        let session = local.map(|store| SessionStore::new(Box::new(store)));
        let user = session.as_ref().and_then(|s| s.load());
        let access_token = session.as_ref().and_then(|s| s.access_token());

        ui::colors::apply_theme(&cc.egui_ctx, &theme);

        let audit_memory = MemorySink::new();
        let rest = match (
            option_env!("LIBRARY_ADMIN_API_URL"),
            option_env!("LIBRARY_ADMIN_API_KEY"),
        ) {
            (Some(url), Some(key)) => Some(RestSink::new(url, key).with_access_token(access_token)),
            _ => {
                log::info!("No API configured, audit entries stay in memory");
                None
            }
        };
        let mut audit = AuditLogger::new((audit_memory.clone(), rest));
        audit.set_user(user.as_ref().map(|u| u.id.clone()));

        let config = GuardConfig::default().with_overrides(
            option_env!("LIBRARY_ADMIN_VERSION_URL"),
            option_env!("LIBRARY_ADMIN_FETCH_TIMEOUT_MS"),
            option_env!("LIBRARY_ADMIN_DEFAULT_REDIRECT"),
        );
        let guard = Rc::new(VersionGuard::new(WebBrowser, config));
        log::info!("Library Admin v{} starting", EMBEDDED_VERSION);

        let update_channel = UpdateChannel::new();
        update_channel.check(cc.egui_ctx.clone(), guard.clone());

        let mut state = AppState::new(theme, user);
        let places_result = Rc::new(RefCell::new(None));
        let places_loader = option_env!("LIBRARY_ADMIN_PLACES_SCRIPT").map(|src| {
            let loader = script_tag_loader(src);
            let result = places_result.clone();
            let ctx = cc.egui_ctx.clone();
            state.places = PlacesStatus::Loading;
            loader.subscribe(move |outcome| {
                *result.borrow_mut() = Some(outcome);
                ctx.request_repaint();
            });
            loader
        });

        Self {
            state,
            update_channel,
            guard,
            audit,
            audit_memory,
            audit_rows_seen: 0,
            places_loader,
            places_result,
        }
    }

    fn handle_update_outcome(&mut self, outcome: CheckOutcome) {
        self.state.update_status = Some(outcome);
        match outcome {
            // A flagged reload means the previous page load just installed
            // this version.
            CheckOutcome::SkippedRecentCheck => {
                self.state.status_message = "Ready".to_string();
                self.state.notifications.push(
                    NotificationKind::Success,
                    format!("Updated to v{}", EMBEDDED_VERSION),
                    "Caches were cleared and the latest version loaded.",
                );
            }
            CheckOutcome::UpToDate => {
                self.state.status_message = "Ready".to_string();
            }
            CheckOutcome::UpdatedAndReloading => {
                self.state.status_message = "New version found, reloading...".to_string();
                self.state.notifications.push(
                    NotificationKind::Info,
                    "Update available",
                    "Reloading to the latest version.",
                );
            }
        }
    }

    fn handle_places_result(&mut self) {
        let Some(result) = self.places_result.borrow_mut().take() else {
            return;
        };

        match result {
            Ok(()) => {
                log::info!("Places autocomplete script loaded");
                self.state.places = PlacesStatus::Ready;
            }
            Err(e) => {
                log::warn!("{}", e);
                self.state.places = PlacesStatus::Failed(e.to_string());
                self.state.notifications.push(
                    NotificationKind::Warning,
                    "Address autocomplete unavailable",
                    e.to_string(),
                );
            }
        }
    }

    fn save_theme(&mut self, ctx: &egui::Context) {
        let before = self.state.theme;
        let after = self.state.theme_draft;
        if before == after {
            return;
        }

        match BrowserStorage::local() {
            Ok(local) => after.save(&local),
            Err(e) => log::warn!("Cannot persist theme colors: {}", e),
        }
        self.state.theme = after;
        ui::colors::apply_theme(ctx, &after);

        let Some(user_id) = self.audit.user_id().map(str::to_string) else {
            return;
        };
        let audit = self.audit.clone();
        let before = serde_json::to_value(before).unwrap_or_default();
        let after = serde_json::to_value(after).unwrap_or_default();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            audit
                .log_update(EntityKind::User, &user_id, &before, &after)
                .await;
            ctx.request_repaint();
        });
    }
}

#[cfg(target_arch = "wasm32")]
impl eframe::App for AdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(outcome) = self.update_channel.try_recv() {
            self.handle_update_outcome(outcome);
        }

        self.handle_places_result();

        // Handle cache clear request
        if self.state.clear_cache_requested && !self.update_channel.is_busy() {
            self.update_channel
                .clear_and_redirect(self.guard.clone(), None);
        }

        // Handle sign out request
        if self.state.sign_out_requested && !self.update_channel.is_busy() {
            self.state.sign_out_requested = false;
            self.state.status_message = "Signing out...".to_string();
            self.update_channel
                .sign_out(self.guard.clone(), self.audit.clone());
        }

        if self.state.theme_save_requested {
            self.state.theme_save_requested = false;
            self.save_theme(ctx);
        }

        // Only re-read the audit log after a write
        let audit_rows = self.audit_memory.len();
        if audit_rows != self.audit_rows_seen {
            self.audit_rows_seen = audit_rows;
            self.state.recent_audit = self.audit_memory.recent_entries(AUDIT_VIEW_LIMIT);
        }
        if self
            .places_loader
            .as_ref()
            .is_some_and(|loader| loader.is_loading())
        {
            self.state.places = PlacesStatus::Loading;
        }

        ui::render_top_bar(ctx, &mut self.state);
        ui::render_sidebar(ctx, &mut self.state);
        ui::render_central_panel(ctx, &self.state);
        ui::render_color_dialog(ctx, &mut self.state);
    }
}
