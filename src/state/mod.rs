//! Application state management.
//!
//! UI panels read and mutate `AppState`; requests that need async work are
//! raised as flags and picked up by the app's update loop.

use library_admin::audit::AuditEntry;
use library_admin::notifications::NotificationCenter;
use library_admin::session::AdminUser;
use library_admin::theme::ThemeColors;
use library_admin::version_guard::CheckOutcome;

/// Sidebar destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Dashboard,
    Libraries,
    Books,
    Copies,
    Loans,
    Readers,
    AuditLog,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Libraries,
        Section::Books,
        Section::Copies,
        Section::Loans,
        Section::Readers,
        Section::AuditLog,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Libraries => "Libraries",
            Self::Books => "Books",
            Self::Copies => "Copies",
            Self::Loans => "Loans",
            Self::Readers => "Readers",
            Self::AuditLog => "Audit Log",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dashboard => "Overview of the network and this client",
            Self::Libraries => "Branches in the network, their addresses and staff",
            Self::Books => "The shared catalog of titles",
            Self::Copies => "Physical copies held by each library",
            Self::Loans => "Active, returned, and overdue loans",
            Self::Readers => "Registered library readers",
            Self::AuditLog => "Admin actions recorded during this session",
        }
    }
}

/// Progress of the optional places autocomplete script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlacesStatus {
    #[default]
    Disabled,
    Loading,
    Ready,
    Failed(String),
}

/// Root application state.
#[derive(Default)]
pub struct AppState {
    /// Selected sidebar section
    pub section: Section,

    /// Application status message displayed in top bar
    pub status_message: String,

    /// Outcome of the startup version check
    pub update_status: Option<CheckOutcome>,

    /// Header popover notifications
    pub notifications: NotificationCenter,

    /// Applied dashboard colors
    pub theme: ThemeColors,

    /// Colors being edited in the dialog
    pub theme_draft: ThemeColors,

    /// Whether the color dialog is shown
    pub color_dialog_open: bool,

    /// Set by the dialog when the draft should be saved and applied
    pub theme_save_requested: bool,

    /// Signed-in admin, if any
    pub user: Option<AdminUser>,

    /// Audit entries recorded this session, newest first
    pub recent_audit: Vec<AuditEntry>,

    /// Places autocomplete availability
    pub places: PlacesStatus,

    /// Set by the sidebar to wipe caches and reload
    pub clear_cache_requested: bool,

    /// Set by the top bar to sign out
    pub sign_out_requested: bool,
}

impl AppState {
    pub fn new(theme: ThemeColors, user: Option<AdminUser>) -> Self {
        Self {
            status_message: "Checking for updates...".to_string(),
            theme,
            theme_draft: theme,
            user,
            ..Default::default()
        }
    }

    /// Opens the color dialog with the applied colors as the draft.
    pub fn open_color_dialog(&mut self) {
        self.theme_draft = self.theme;
        self.color_dialog_open = true;
    }
}
