//! Color configuration dialog.

use super::colors;
use crate::state::AppState;
use eframe::egui::{self, RichText};
use library_admin::theme::{to_hex, ThemeColors};

pub fn render_color_dialog(ctx: &egui::Context, state: &mut AppState) {
    if !state.color_dialog_open {
        return;
    }

    let mut open = true;
    let mut close = false;

    egui::Window::new("Dashboard colors")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("color_grid")
                .num_columns(3)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    color_row(ui, "Primary", &mut state.theme_draft.primary);
                    color_row(ui, "Accent", &mut state.theme_draft.accent);
                    color_row(ui, "Sidebar", &mut state.theme_draft.sidebar);
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    state.theme_save_requested = true;
                    close = true;
                }
                if ui.button("Reset to defaults").clicked() {
                    state.theme_draft = ThemeColors::default();
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });

    if !open || close {
        state.color_dialog_open = false;
    }
}

fn color_row(ui: &mut egui::Ui, label: &str, rgb: &mut [u8; 3]) {
    ui.label(label);
    ui.color_edit_button_srgb(rgb);
    ui.label(RichText::new(to_hex(*rgb)).monospace().color(colors::ui::VALUE));
    ui.end_row();
}
