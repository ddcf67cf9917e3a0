//! Centralized color constants for the UI.
//!
//! This module provides consistent colors across all UI panels. User-chosen
//! colors live in `ThemeColors`; `to_color32` bridges the two.

use eframe::egui::{self, Color32};
use library_admin::theme::ThemeColors;

/// Converts a stored sRGB triple.
pub fn to_color32(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Applies user colors on top of the dark visuals.
pub fn apply_theme(ctx: &egui::Context, theme: &ThemeColors) {
    let mut visuals = egui::Visuals::dark();
    visuals.selection.bg_fill = to_color32(theme.primary);
    visuals.hyperlink_color = to_color32(theme.accent);
    ctx.set_visuals(visuals);
}

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for field labels.
    pub const LABEL: Color32 = Color32::from_rgb(120, 120, 130);
    /// Slightly brighter for field values.
    pub const VALUE: Color32 = Color32::from_rgb(180, 180, 190);
    /// Title text.
    pub const TITLE: Color32 = Color32::WHITE;
    /// Success/positive indicator.
    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    /// Warning indicator.
    pub const WARNING: Color32 = Color32::from_rgb(255, 180, 50);
    /// Error indicator.
    pub const ERROR: Color32 = Color32::from_rgb(255, 80, 80);
}

/// Colors for notification kinds in the header popover.
pub mod notifications {
    use super::Color32;
    use library_admin::notifications::NotificationKind;

    pub fn kind(kind: NotificationKind) -> Color32 {
        match kind {
            NotificationKind::Info => Color32::from_rgb(100, 180, 255),
            NotificationKind::Success => super::ui::SUCCESS,
            NotificationKind::Warning => super::ui::WARNING,
            NotificationKind::Error => super::ui::ERROR,
        }
    }

    /// Dimmed text for notifications already read.
    pub const READ: Color32 = Color32::from_rgb(110, 110, 120);
}
