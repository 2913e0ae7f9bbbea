use chrono::{NaiveDate, NaiveDateTime};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::calendar::{CalendarSession, WeekData};
use crate::grid::{CalendarGrid, CellActivation};
use crate::gui::async_bridge::Command;
use crate::model::Viewer;
use crate::resolver::CellView;
use crate::util::day_header;
use crate::week::WeekStep;

/// What the user opened from the grid.
pub enum CalendarEvent {
    Cell(CellActivation),
    DayHistory(NaiveDate),
}

pub struct CalendarView;

const HEADER_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 30.0;

/// Fill and text colour for a resolver style class.
fn class_colors(class: &str) -> (Color32, Color32) {
    match class {
        "closed" => (Color32::from_gray(70), Color32::from_gray(160)),
        "finalized" => (Color32::from_gray(45), Color32::from_gray(120)),
        "attendance" => (Color32::from_rgb(90, 60, 140), Color32::WHITE),
        "unavailable" => (Color32::from_rgb(120, 50, 50), Color32::from_gray(220)),
        "confirmed" => (Color32::from_rgb(40, 110, 200), Color32::WHITE),
        "pending" => (Color32::from_rgb(220, 160, 30), Color32::BLACK),
        "bookable-high" => (Color32::from_rgb(40, 150, 70), Color32::WHITE),
        "bookable-medium" => (Color32::from_rgb(150, 170, 40), Color32::BLACK),
        "bookable-low" => (Color32::from_rgb(210, 110, 40), Color32::BLACK),
        _ => (Color32::from_rgb(190, 40, 40), Color32::WHITE),
    }
}

pub fn cell_colors(view: &CellView) -> (Color32, Color32) {
    class_colors(view.style_class())
}

impl CalendarView {
    pub fn show(
        ui: &mut Ui,
        session: &mut CalendarSession,
        viewer: Viewer,
        now: NaiveDateTime,
        loading: bool,
        cmd_tx: &std::sync::mpsc::Sender<Command>,
    ) -> Option<CalendarEvent> {
        Self::controls(ui, session, viewer, now, loading, cmd_tx);
        ui.add_space(8.0);
        Self::legend(ui);
        ui.add_space(8.0);

        match session.data() {
            WeekData::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Cargando calendario...");
                });
                None
            }
            WeekData::Failed(message) => {
                let message = message.clone();
                ui.colored_label(Color32::from_rgb(220, 50, 50), message);
                if ui.button("Reintentar").clicked() {
                    let _ = cmd_tx.send(Command::LoadWeek(session.retry()));
                }
                None
            }
            WeekData::Ready(_) => {
                let grid = session.grid(viewer, now)?;
                Self::table(ui, &grid, viewer, now)
            }
        }
    }

    fn controls(
        ui: &mut Ui,
        session: &mut CalendarSession,
        viewer: Viewer,
        now: NaiveDateTime,
        loading: bool,
        cmd_tx: &std::sync::mpsc::Sender<Command>,
    ) {
        ui.horizontal(|ui| {
            if ui.button("◀ Anterior").clicked() {
                let _ = cmd_tx.send(Command::LoadWeek(session.step(WeekStep::Previous)));
            }
            if ui.button("Hoy").clicked() {
                let _ = cmd_tx.send(Command::LoadWeek(session.go_to_today(now.date())));
            }
            if ui.button("Siguiente ▶").clicked() {
                let _ = cmd_tx.send(Command::LoadWeek(session.step(WeekStep::Next)));
            }
            ui.heading(session.anchor().to_string());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!loading, egui::Button::new("Actualizar"))
                    .clicked()
                {
                    let _ = cmd_tx.send(Command::LoadWeek(session.refresh()));
                }
                if viewer.is_staff()
                    && ui
                        .add_enabled(!loading, egui::Button::new("Generar semana"))
                        .on_hover_text("Crear los turnos de lunes a sábado de esta semana")
                        .clicked()
                {
                    let _ = cmd_tx.send(Command::GenerateWeek {
                        viewer,
                        week: session.anchor(),
                    });
                }
                if loading {
                    ui.spinner();
                }
            });
        });
    }

    fn legend(ui: &mut Ui) {
        let entries = [
            ("bookable-high", "Muchos cupos"),
            ("bookable-medium", "Algunos cupos"),
            ("bookable-low", "Pocos cupos"),
            ("full", "Completo"),
            ("pending", "Por confirmar"),
            ("confirmed", "Confirmado"),
            ("closed", "Cerrado"),
        ];
        ui.horizontal_wrapped(|ui| {
            for (class, label) in entries {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, class_colors(class).0);
                ui.label(label);
                ui.add_space(8.0);
            }
        });
    }

    fn table(
        ui: &mut Ui,
        grid: &CalendarGrid,
        viewer: Viewer,
        now: NaiveDateTime,
    ) -> Option<CalendarEvent> {
        let mut event = None;

        ui.push_id("calendar_table", |ui| {
            TableBuilder::new(ui)
                .striped(false)
                .cell_layout(egui::Layout::centered_and_justified(egui::Direction::TopDown))
                .column(Column::exact(56.0))
                .columns(Column::remainder().at_least(80.0), grid.days.len())
                .header(HEADER_HEIGHT, |mut header| {
                    header.col(|ui| {
                        ui.strong("Hora");
                    });
                    for day in &grid.days {
                        header.col(|ui| {
                            let mut text = RichText::new(day_header(day.date)).strong();
                            if day.is_today {
                                text = text.color(Color32::from_rgb(60, 170, 220));
                            }
                            let past = day.date < now.date();
                            if past && viewer.is_staff() && !day.is_sunday {
                                if ui
                                    .add(egui::Button::new(text).frame(false))
                                    .on_hover_text("Ver asistencia del día")
                                    .clicked()
                                {
                                    event = Some(CalendarEvent::DayHistory(day.date));
                                }
                            } else {
                                ui.label(text);
                            }
                        });
                    }
                })
                .body(|mut body| {
                    for row in &grid.rows {
                        body.row(ROW_HEIGHT, |mut table_row| {
                            table_row.col(|ui| {
                                ui.label(row.hour.format("%H:%M").to_string());
                            });
                            for cell in &row.cells {
                                table_row.col(|ui| {
                                    let (fill, text) = cell_colors(&cell.view);
                                    let button = egui::Button::new(
                                        RichText::new(cell.view.label()).color(text),
                                    )
                                    .fill(fill);
                                    if ui.add_enabled(cell.view.clickable, button).clicked() {
                                        event = cell.activation().map(CalendarEvent::Cell);
                                    }
                                });
                            }
                        });
                    }
                });
        });

        event
    }
}
