use eframe::egui::{self, Color32, RichText};

use crate::attendance::{AttendanceMark, AttendanceSheet};
use crate::util::{day_header, truncate};

pub struct AttendanceView;

impl AttendanceView {
    /// Returns true once the window is closed.
    pub fn show(ctx: &egui::Context, sheet: &AttendanceSheet) -> bool {
        let mut open = true;
        let mut close = false;

        egui::Window::new(format!("Historial de asistencia - {}", day_header(sheet.date)))
            .id(egui::Id::new("attendance"))
            .open(&mut open)
            .collapsible(false)
            .default_width(380.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.strong(format!("Total de asistentes: {}", sheet.total()));
                ui.add_space(8.0);

                if sheet.is_empty() {
                    ui.label("No hubo asistentes confirmados.");
                }

                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    for group in &sheet.groups {
                        let count = group.entries.len();
                        ui.group(|ui| {
                            ui.strong(format!(
                                "{}hs ({} asistente{})",
                                group.hour.format("%H:%M"),
                                count,
                                if count == 1 { "" } else { "s" }
                            ));
                            for entry in &group.entries {
                                ui.horizontal(|ui| {
                                    ui.label(truncate(&entry.member, 24));
                                    ui.weak(format!("#{}", entry.slot_id));
                                    let color = match entry.mark {
                                        AttendanceMark::Confirmed => Color32::from_rgb(50, 180, 50),
                                        AttendanceMark::Cancelled => Color32::from_rgb(220, 50, 50),
                                        AttendanceMark::Finished => Color32::GRAY,
                                    };
                                    ui.label(RichText::new(entry.mark.label()).color(color));
                                });
                            }
                        });
                        ui.add_space(4.0);
                    }
                });

                ui.add_space(8.0);
                if ui.button("Cerrar").clicked() {
                    close = true;
                }
            });

        close || !open
    }
}
