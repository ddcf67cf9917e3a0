//! Central panel UI: the selected section.

use super::colors;
use crate::state::{AppState, PlacesStatus, Section};
use eframe::egui::{self, RichText};
use library_admin::version_guard::EMBEDDED_VERSION;

pub fn render_central_panel(ctx: &egui::Context, state: &AppState) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading(state.section.label());
        ui.label(RichText::new(state.section.description()).color(colors::ui::LABEL));
        ui.separator();

        match state.section {
            Section::Dashboard => render_dashboard(ui, state),
            Section::Libraries => render_libraries(ui, state),
            Section::AuditLog => render_audit_log(ui, state),
            _ => {
                ui.label("Records for this section are managed in the hosted database.");
            }
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            egui::warn_if_debug_build(ui);
        });
    });
}

fn render_dashboard(ui: &mut egui::Ui, state: &AppState) {
    egui::Grid::new("dashboard_info")
        .num_columns(2)
        .spacing([16.0, 6.0])
        .show(ui, |ui| {
            field(ui, "Client version", EMBEDDED_VERSION);
            field(
                ui,
                "Update check",
                state
                    .update_status
                    .map(|o| o.label())
                    .unwrap_or("Pending"),
            );
            field(
                ui,
                "Signed in as",
                state
                    .user
                    .as_ref()
                    .map(|u| u.email.as_str())
                    .unwrap_or("Nobody"),
            );
            field(
                ui,
                "Unread notifications",
                &state.notifications.unread_count().to_string(),
            );
        });
}

fn render_libraries(ui: &mut egui::Ui, state: &AppState) {
    let (text, color) = match &state.places {
        PlacesStatus::Disabled => ("not configured".to_string(), colors::ui::LABEL),
        PlacesStatus::Loading => ("loading...".to_string(), colors::ui::VALUE),
        PlacesStatus::Ready => ("ready".to_string(), colors::ui::SUCCESS),
        PlacesStatus::Failed(e) => (format!("unavailable ({})", e), colors::ui::ERROR),
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new("Address autocomplete:").color(colors::ui::LABEL));
        ui.label(RichText::new(text).color(color));
    });
}

fn render_audit_log(ui: &mut egui::Ui, state: &AppState) {
    if state.recent_audit.is_empty() {
        ui.label(RichText::new("No actions recorded yet").color(colors::ui::LABEL));
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("audit_log")
            .num_columns(4)
            .striped(true)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                for header in ["Time", "Action", "Entity", "User"] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for entry in &state.recent_audit {
                    ui.label(RichText::new(&entry.created_at).monospace().small());
                    ui.label(entry.action.as_str());
                    ui.label(format!(
                        "{} {}",
                        entry.entity_type.as_str(),
                        entry.entity_id.as_deref().unwrap_or("")
                    ));
                    ui.label(entry.user_id.as_deref().unwrap_or("-"));
                    ui.end_row();
                }
            });
    });
}

fn field(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).color(colors::ui::LABEL));
    ui.label(RichText::new(value).color(colors::ui::VALUE));
    ui.end_row();
}
