use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use eframe::egui;

use crate::alerts::AlertMediator;
use crate::attendance::AttendanceSheet;
use crate::calendar::{CalendarSession, WeekData};
use crate::config::Config;
use crate::dispatch::{BookingAction, SlotSelection};
use crate::gui::async_bridge::{run_async_bridge, Command, Response};
use crate::gui::views::alert::AlertOverlay;
use crate::gui::views::attendance::AttendanceView;
use crate::gui::views::calendar::{CalendarEvent, CalendarView};
use crate::gui::views::member_picker::{MemberPickerState, MemberPickerView, PickerEvent};
use crate::gui::views::slot_detail::{DetailEvent, SlotDetailView};
use crate::model::{UserSummary, Viewer};
use crate::week::WeekAnchor;

pub struct TurnosApp {
    cmd_tx: Sender<Command>,
    resp_rx: Receiver<Response>,
    alerts: AlertMediator,

    session: CalendarSession,
    viewer: Viewer,
    members: Option<Vec<UserSummary>>,

    detail: Option<SlotSelection>,
    picker: Option<MemberPickerState>,
    attendance: Option<AttendanceSheet>,

    pending: usize,
    busy: bool,
}

impl TurnosApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let (cmd_tx, cmd_rx) = channel();
        let (resp_tx, resp_rx) = channel();
        let alerts = AlertMediator::new(config.alerts.notice_timeout());

        run_async_bridge(
            config,
            alerts.clone(),
            cmd_rx,
            resp_tx,
            cc.egui_ctx.clone(),
        );

        let mut session = CalendarSession::new(WeekAnchor::current());
        let _ = cmd_tx.send(Command::Identify);
        let _ = cmd_tx.send(Command::LoadWeek(session.load()));

        Self {
            cmd_tx,
            resp_rx,
            alerts,
            session,
            viewer: Viewer::Guest,
            members: None,
            detail: None,
            picker: None,
            attendance: None,
            pending: 0,
            busy: false,
        }
    }

    fn process_responses(&mut self, now: NaiveDateTime) {
        while let Ok(response) = self.resp_rx.try_recv() {
            match response {
                Response::Identity(viewer) => {
                    self.viewer = viewer;
                }
                Response::WeekLoaded { ticket, result } => {
                    self.session.apply(ticket, result);
                }
                Response::ActionFinished(report) => {
                    self.busy = false;
                    if report.close_view {
                        self.detail = None;
                        self.picker = None;
                    }
                    if let Some(refresh) = report.refresh {
                        self.session.apply_refresh(refresh);
                        self.reselect(now);
                    }
                }
                Response::WeekGenerated(report) => {
                    if let Some(refresh) = report.refresh {
                        self.session.apply_refresh(refresh);
                    }
                }
                Response::MembersLoaded(members) => {
                    self.members = Some(members);
                }
                Response::OperationError(msg) => {
                    self.busy = false;
                    self.alerts.error(&msg);
                }
                Response::Loading(true) => self.pending += 1,
                Response::Loading(false) => self.pending = self.pending.saturating_sub(1),
            }
        }
    }

    /// Point the open detail view at the freshly loaded bundle.
    fn reselect(&mut self, now: NaiveDateTime) {
        let Some(selection) = &self.detail else {
            return;
        };
        let Some(grid) = self.session.grid(self.viewer, now) else {
            return;
        };
        if let Some(activation) = grid.activate(selection.date, selection.hour) {
            self.detail = Some(activation.into());
        }
    }

    fn run(&mut self, action: BookingAction) {
        let Some(selection) = self.detail.clone() else {
            return;
        };
        self.busy = true;
        let _ = self.cmd_tx.send(Command::Dispatch {
            selection,
            action,
            viewer: self.viewer,
            week: self.session.anchor(),
        });
    }

    fn open_cell(&mut self, event: CalendarEvent) {
        match event {
            CalendarEvent::Cell(activation) if activation.history => {
                self.attendance = Some(AttendanceSheet::for_cell(
                    activation.date,
                    activation.hour,
                    &activation.bundle,
                ));
            }
            CalendarEvent::Cell(activation) => {
                self.picker = None;
                self.detail = Some(activation.into());
            }
            CalendarEvent::DayHistory(date) => {
                let sheet = match self.session.data() {
                    WeekData::Ready(days) => days
                        .iter()
                        .find(|d| d.date == date)
                        .map(AttendanceSheet::for_day),
                    _ => None,
                };
                self.attendance = Some(sheet.unwrap_or_else(|| AttendanceSheet::empty(date)));
            }
        }
    }

    fn windows(&mut self, ctx: &egui::Context, now: NaiveDateTime) {
        if let Some(selection) = &self.detail {
            match SlotDetailView::show(ctx, selection, self.viewer, now, self.busy) {
                Some(DetailEvent::Run(action)) => self.run(action),
                Some(DetailEvent::PickMember(slot)) => {
                    if self.members.is_none() {
                        let _ = self.cmd_tx.send(Command::LoadMembers);
                    }
                    self.picker = Some(MemberPickerState::new(slot));
                }
                Some(DetailEvent::Close) => {
                    self.detail = None;
                    self.picker = None;
                }
                None => {}
            }
        }

        if let Some(state) = &mut self.picker {
            match MemberPickerView::show(ctx, state, self.members.as_deref(), self.busy) {
                Some(PickerEvent::Chosen(member_id)) => {
                    if let Some(action) = state.slot.with_member(Some(member_id)) {
                        self.run(action);
                    }
                }
                Some(PickerEvent::Close) => self.picker = None,
                None => {}
            }
        }

        if let Some(sheet) = &self.attendance {
            if AttendanceView::show(ctx, sheet) {
                self.attendance = None;
            }
        }
    }

    fn alert(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.alerts.expire_due(now);

        let Some(alert) = self.alerts.current() else {
            return;
        };
        if let Some(deadline) = alert.expires_at {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
        if let Some(accepted) = AlertOverlay::show(ctx, &alert) {
            self.alerts.respond(alert.id, accepted);
        }
    }
}

impl eframe::App for TurnosApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Local::now().naive_local();
        self.process_responses(now);

        egui::TopBottomPanel::top("session_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Turnos");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let who = match self.viewer {
                        Viewer::Guest => "Sin sesión",
                        Viewer::Member => "Socio",
                        Viewer::Staff => "Personal",
                    };
                    ui.label(who);
                });
            });
        });

        let mut opened = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                opened = CalendarView::show(
                    ui,
                    &mut self.session,
                    self.viewer,
                    now,
                    self.pending > 0,
                    &self.cmd_tx,
                );
            });
        });

        if let Some(event) = opened {
            self.open_cell(event);
        }
        self.windows(ctx, now);
        self.alert(ctx);
    }
}
