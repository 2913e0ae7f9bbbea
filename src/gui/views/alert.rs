use eframe::egui::{self, Color32, RichText};

use crate::alerts::{AlertKind, AlertView};

pub struct AlertOverlay;

impl AlertOverlay {
    /// Draw the single visible alert. Returns the user's answer once a button
    /// is pressed.
    pub fn show(ctx: &egui::Context, alert: &AlertView) -> Option<bool> {
        let accent = match alert.kind {
            AlertKind::Success => Color32::from_rgb(50, 180, 50),
            AlertKind::Info => Color32::from_rgb(60, 140, 220),
            AlertKind::Warning => Color32::from_rgb(220, 160, 30),
            AlertKind::Error => Color32::from_rgb(220, 50, 50),
            AlertKind::Confirm => Color32::from_rgb(60, 170, 220),
        };
        let mut answer = None;

        egui::Window::new(RichText::new(&alert.title).color(accent).strong())
            .id(egui::Id::new(("alert", alert.id)))
            .collapsible(false)
            .resizable(false)
            .title_bar(true)
            .anchor(egui::Align2::CENTER_TOP, [0.0, 48.0])
            .show(ctx, |ui| {
                ui.set_min_width(280.0);
                ui.label(&alert.message);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui
                        .button(RichText::new(&alert.confirm_text).color(accent))
                        .clicked()
                    {
                        answer = Some(true);
                    }
                    if let Some(cancel) = &alert.cancel_text {
                        if ui.button(cancel).clicked() {
                            answer = Some(false);
                        }
                    }
                });
            });

        answer
    }
}
