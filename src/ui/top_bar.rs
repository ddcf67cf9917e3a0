//! Top bar UI: app title, build version, status, notifications, account.

use super::colors;
use crate::state::AppState;
use eframe::egui::{self, RichText};
use library_admin::version_guard::{CheckOutcome, EMBEDDED_VERSION};

pub fn render_top_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                // App title
                ui.label(
                    RichText::new("Library Network Admin")
                        .strong()
                        .size(16.0)
                        .color(colors::ui::TITLE),
                );

                ui.label(
                    RichText::new(format!("v{}", EMBEDDED_VERSION))
                        .size(12.0)
                        .monospace()
                        .color(colors::ui::LABEL),
                );

                ui.separator();

                // Status text
                let status_color = match state.update_status {
                    Some(CheckOutcome::UpdatedAndReloading) => colors::ui::WARNING,
                    _ => colors::ui::VALUE,
                };
                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(status_color),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    render_account(ui, state);
                    ui.separator();
                    render_notifications(ui, state);
                });
            });
        });
}

fn render_account(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(user) = &state.user else {
        ui.label(RichText::new("Not signed in").color(colors::ui::LABEL));
        return;
    };

    let label = format!("{} ({})", user.full_name, user.role.label());
    ui.menu_button(label, |ui| {
        ui.label(RichText::new(&user.email).small().color(colors::ui::LABEL));
        ui.separator();
        if ui.button("Sign out").clicked() {
            state.sign_out_requested = true;
        }
    });
}

fn render_notifications(ui: &mut egui::Ui, state: &mut AppState) {
    let unread = state.notifications.unread_count();
    let title = if unread > 0 {
        format!("Notifications ({})", unread)
    } else {
        "Notifications".to_string()
    };

    ui.menu_button(title, |ui| {
        ui.set_min_width(280.0);

        if state.notifications.items().is_empty() {
            ui.label(RichText::new("Nothing new").color(colors::ui::LABEL));
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .max_height(320.0)
            .show(ui, |ui| {
                for n in state.notifications.items() {
                    let title_color = if n.read {
                        colors::notifications::READ
                    } else {
                        colors::notifications::kind(n.kind)
                    };

                    let response = ui
                        .vertical(|ui| {
                            ui.label(RichText::new(&n.title).strong().color(title_color));
                            if !n.body.is_empty() {
                                ui.label(RichText::new(&n.body).small());
                            }
                            ui.label(
                                RichText::new(format_timestamp(n.created_at))
                                    .small()
                                    .color(colors::ui::LABEL),
                            );
                        })
                        .response;

                    if response.interact(egui::Sense::click()).clicked() {
                        clicked = Some(n.id);
                    }
                    ui.separator();
                }
            });

        if let Some(id) = clicked {
            state.notifications.mark_read(id);
        }

        ui.horizontal(|ui| {
            if ui.button("Mark all read").clicked() {
                state.notifications.mark_all_read();
            }
            if ui.button("Clear").clicked() {
                state.notifications.clear();
            }
        });
    });
}

fn format_timestamp(unix_seconds: i64) -> String {
    chrono::DateTime::from_timestamp(unix_seconds, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}
