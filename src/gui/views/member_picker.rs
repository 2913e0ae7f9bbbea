use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::dispatch::SlotAction;
use crate::members::search;
use crate::model::UserSummary;
use crate::util::truncate;

pub struct MemberPickerState {
    pub slot: SlotAction,
    pub query: String,
}

impl MemberPickerState {
    pub fn new(slot: SlotAction) -> Self {
        Self {
            slot,
            query: String::new(),
        }
    }
}

pub enum PickerEvent {
    Chosen(u64),
    Close,
}

pub struct MemberPickerView;

impl MemberPickerView {
    pub fn show(
        ctx: &egui::Context,
        state: &mut MemberPickerState,
        members: Option<&[UserSummary]>,
        busy: bool,
    ) -> Option<PickerEvent> {
        let mut event = None;
        let mut open = true;

        egui::Window::new("Reservar turno para socio")
            .id(egui::Id::new("member_picker"))
            .open(&mut open)
            .collapsible(false)
            .default_width(420.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Buscar:");
                    ui.add(
                        egui::TextEdit::singleline(&mut state.query)
                            .hint_text("Usuario o email")
                            .desired_width(220.0),
                    );
                });
                ui.add_space(8.0);

                match members {
                    None => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Cargando socios...");
                        });
                    }
                    Some(members) => {
                        let found = search(members, &state.query);
                        if found.is_empty() {
                            ui.label("No se encontraron socios.");
                        } else if let Some(id) = Self::table(ui, &found, busy) {
                            event = Some(PickerEvent::Chosen(id));
                        }
                    }
                }
            });

        if !open {
            event = Some(PickerEvent::Close);
        }
        event
    }

    fn table(ui: &mut Ui, found: &[&UserSummary], busy: bool) -> Option<u64> {
        let mut chosen = None;
        ui.push_id("member_picker_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::remainder().at_least(120.0))
                .column(Column::auto().at_least(160.0))
                .column(Column::auto().at_least(70.0))
                .min_scrolled_height(0.0)
                .max_scroll_height(300.0)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Usuario");
                    });
                    header.col(|ui| {
                        ui.strong("Email");
                    });
                    header.col(|_| {});
                })
                .body(|mut body| {
                    for member in found {
                        body.row(25.0, |mut row| {
                            row.col(|ui| {
                                ui.label(truncate(&member.username, 20));
                            });
                            row.col(|ui| {
                                ui.label(truncate(member.email.as_deref().unwrap_or("-"), 28));
                            });
                            row.col(|ui| {
                                if ui
                                    .add_enabled(!busy, egui::Button::new("Reservar"))
                                    .clicked()
                                {
                                    chosen = Some(member.id);
                                }
                            });
                        });
                    }
                });
        });
        chosen
    }
}
