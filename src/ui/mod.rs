//! UI modules for the Library Admin dashboard.
//!
//! The UI is split into distinct panels:
//! - Top bar: title, build version, status, notifications, account menu
//! - Sidebar: section navigation and maintenance actions
//! - Central panel: the selected section
//! - Color dialog: dashboard color configuration

mod central_panel;
mod color_dialog;
pub mod colors;
mod sidebar;
mod top_bar;

pub use central_panel::render_central_panel;
pub use color_dialog::render_color_dialog;
pub use sidebar::render_sidebar;
pub use top_bar::render_top_bar;
