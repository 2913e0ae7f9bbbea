use chrono::NaiveDateTime;
use eframe::egui::{self, Color32, RichText};
use egui_extras::{Column, TableBuilder};

use crate::dispatch::{ActionKind, BookingAction, SlotAction, SlotSelection, cancel_window_open};
use crate::model::{ReservationState, Viewer};
use crate::util::{day_header, format_duration, truncate};

pub enum DetailEvent {
    Run(BookingAction),
    PickMember(SlotAction),
    Close,
}

pub struct SlotDetailView;

impl SlotDetailView {
    pub fn show(
        ctx: &egui::Context,
        selection: &SlotSelection,
        viewer: Viewer,
        now: NaiveDateTime,
        busy: bool,
    ) -> Option<DetailEvent> {
        let mut event = None;
        let mut open = true;
        let title = format!(
            "{} - {}hs",
            day_header(selection.date),
            selection.hour.format("%H:%M")
        );

        egui::Window::new(title)
            .id(egui::Id::new("slot_detail"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let bundle = &selection.bundle;
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{}", bundle.available)).size(22.0).strong());
                    ui.label(format!("de {} cupos libres", bundle.total));
                    ui.separator();
                    ui.label(format!("Reservados: {}", bundle.reserved));
                    ui.label(format!("Confirmados: {}", bundle.confirmed));
                });

                let until = selection.starts_at() - now;
                if until > chrono::Duration::zero() {
                    ui.label(format!("Comienza en {}", format_duration(until)));
                }
                ui.add_space(8.0);

                for own in bundle.own_reservations() {
                    let (text, color) = match own.state {
                        ReservationState::Reserved => {
                            ("Tenés una reserva pendiente de confirmar", Color32::from_rgb(220, 160, 30))
                        }
                        ReservationState::Confirmed if cancel_window_open(selection.starts_at(), now) => {
                            ("Turno confirmado. Podés cancelar hasta 1 hora antes", Color32::from_rgb(60, 140, 220))
                        }
                        ReservationState::Confirmed => {
                            ("Ya no podés cancelar (menos de 1 hora)", Color32::from_rgb(220, 50, 50))
                        }
                        _ => continue,
                    };
                    ui.colored_label(color, text);
                }

                if viewer.is_staff() {
                    Self::holders(ui, selection);
                }

                ui.add_space(8.0);
                let actions = selection.available_actions(viewer, now);
                if actions.is_empty() {
                    ui.label("Sin acciones disponibles.");
                }
                ui.horizontal_wrapped(|ui| {
                    for action in actions {
                        let label = match action.kind {
                            ActionKind::CancelForMember => {
                                format!("{} #{}", action.kind.label(), action.slot_id)
                            }
                            _ => action.kind.label().to_string(),
                        };
                        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                            event = match action.with_member(None) {
                                Some(booking) => Some(DetailEvent::Run(booking)),
                                None => Some(DetailEvent::PickMember(action)),
                            };
                        }
                    }
                    if busy {
                        ui.spinner();
                    }
                });
            });

        if !open {
            event = Some(DetailEvent::Close);
        }
        event
    }

    fn holders(ui: &mut egui::Ui, selection: &SlotSelection) {
        let claimed: Vec<_> = selection
            .bundle
            .reservations
            .iter()
            .filter(|r| r.is_claimed())
            .collect();
        if claimed.is_empty() {
            return;
        }

        ui.add_space(8.0);
        ui.strong("Socios anotados");
        ui.push_id("slot_holders_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(50.0))
                .column(Column::remainder().at_least(120.0))
                .column(Column::auto().at_least(90.0))
                .max_scroll_height(160.0)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("ID");
                    });
                    header.col(|ui| {
                        ui.strong("Socio");
                    });
                    header.col(|ui| {
                        ui.strong("Estado");
                    });
                })
                .body(|mut body| {
                    for r in claimed {
                        body.row(22.0, |mut row| {
                            row.col(|ui| {
                                ui.label(r.id.to_string());
                            });
                            row.col(|ui| {
                                let holder = r
                                    .member
                                    .as_ref()
                                    .map(|m| truncate(&m.to_string(), 20))
                                    .unwrap_or_else(|| "-".to_string());
                                ui.label(holder);
                            });
                            row.col(|ui| {
                                ui.label(r.state.label());
                            });
                        });
                    }
                });
        });
    }
}
