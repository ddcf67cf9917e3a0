//! Sidebar UI: section navigation and maintenance actions.

use super::colors;
use crate::state::{AppState, Section};
use eframe::egui::{self, RichText};

pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    let frame = egui::Frame::side_top_panel(&ctx.style()).fill(colors::to_color32(state.theme.sidebar));

    egui::SidePanel::left("sidebar")
        .resizable(false)
        .exact_width(190.0)
        .frame(frame)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.label(RichText::new("NAVIGATION").small().color(colors::ui::LABEL));
            ui.add_space(4.0);

            for section in Section::ALL {
                let selected = state.section == section;
                let text = if selected {
                    RichText::new(section.label())
                        .strong()
                        .color(colors::to_color32(state.theme.primary))
                } else {
                    RichText::new(section.label())
                };
                if ui.selectable_label(selected, text).clicked() {
                    state.section = section;
                }
            }

            ui.add_space(16.0);
            ui.separator();
            ui.label(RichText::new("SETTINGS").small().color(colors::ui::LABEL));
            ui.add_space(4.0);

            if ui.button("Colors...").clicked() {
                state.open_color_dialog();
            }

            ui.add_enabled_ui(!state.clear_cache_requested, |ui| {
                if ui
                    .button("Clear cache and reload")
                    .on_hover_text("Removes cached assets and data, keeping you signed in")
                    .clicked()
                {
                    state.clear_cache_requested = true;
                    state.status_message = "Clearing cache...".to_string();
                }
            });
        });
}
