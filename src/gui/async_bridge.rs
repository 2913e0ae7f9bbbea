use std::sync::mpsc::{Receiver, Sender};

use chrono::Local;
use eframe::egui;
use tokio::runtime::Runtime;
use tracing::{debug, error, warn};

use crate::alerts::AlertMediator;
use crate::api::TurnosClient;
use crate::calendar::FetchTicket;
use crate::config::Config;
use crate::dispatch::{
    BookingAction, BookingDispatcher, DispatchReport, GenerationReport, SlotSelection,
};
use crate::members::members_only;
use crate::model::{DaySchedule, UserSummary, Viewer};
use crate::week::WeekAnchor;

/// Commands sent from GUI to async thread
#[derive(Debug)]
pub enum Command {
    Identify,
    LoadWeek(FetchTicket),
    Dispatch {
        selection: SlotSelection,
        action: BookingAction,
        viewer: Viewer,
        week: WeekAnchor,
    },
    GenerateWeek {
        viewer: Viewer,
        week: WeekAnchor,
    },
    LoadMembers,
}

/// Responses sent from async thread to GUI
#[derive(Debug)]
pub enum Response {
    Identity(Viewer),
    WeekLoaded {
        ticket: FetchTicket,
        result: Result<Vec<DaySchedule>, String>,
    },
    ActionFinished(DispatchReport),
    WeekGenerated(GenerationReport),
    MembersLoaded(Vec<UserSummary>),
    OperationError(String),
    Loading(bool),
}

/// Holds the API client and logs in again once the session is gone
struct ClientManager {
    config: Config,
    client: Option<TurnosClient>,
}

impl ClientManager {
    fn new(config: Config) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Get a logged-in client. A client whose refresh token was rejected has
    /// dropped its session and is replaced.
    async fn get_client(&mut self) -> Result<TurnosClient, String> {
        if let Some(client) = &self.client {
            if client.is_logged_in().await {
                return Ok(client.clone());
            }
            debug!("Session dropped, logging in again");
        }
        self.login().await
    }

    async fn login(&mut self) -> Result<TurnosClient, String> {
        let client = TurnosClient::new(&self.config)
            .map_err(|e| format!("No se pudo iniciar el cliente: {}", e))?
            .login()
            .await
            .map_err(|e| {
                error!("Login failed: {}", e);
                format!("No se pudo iniciar sesión: {}", e)
            })?;
        self.client = Some(client.clone());
        Ok(client)
    }
}

/// Runs the async bridge in a background thread
pub fn run_async_bridge(
    config: Config,
    alerts: AlertMediator,
    cmd_rx: Receiver<Command>,
    resp_tx: Sender<Response>,
    ctx: egui::Context,
) {
    std::thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = resp_tx.send(Response::OperationError(format!(
                    "No se pudo iniciar el runtime: {}",
                    e
                )));
                ctx.request_repaint();
                return;
            }
        };

        rt.block_on(async {
            // Alerts raised by background flows must reach the screen
            let mut alert_rx = alerts.subscribe();
            let repaint_ctx = ctx.clone();
            tokio::spawn(async move {
                while alert_rx.changed().await.is_ok() {
                    repaint_ctx.request_repaint();
                }
            });

            let mut manager = ClientManager::new(config);

            loop {
                let Ok(cmd) = cmd_rx.recv() else {
                    // Channel closed, exit
                    break;
                };

                let client = match manager.get_client().await {
                    Ok(client) => client,
                    Err(e) => {
                        match cmd {
                            Command::Identify => {
                                let _ = resp_tx.send(Response::Identity(Viewer::Guest));
                            }
                            Command::LoadWeek(ticket) => {
                                let _ = resp_tx.send(Response::WeekLoaded {
                                    ticket,
                                    result: Err(e.clone()),
                                });
                            }
                            _ => {}
                        }
                        let _ = resp_tx.send(Response::OperationError(e));
                        ctx.request_repaint();
                        continue;
                    }
                };

                let resp_tx = resp_tx.clone();
                let ctx = ctx.clone();
                let alerts = alerts.clone();
                tokio::spawn(async move {
                    let _ = resp_tx.send(Response::Loading(true));
                    ctx.request_repaint();
                    let response = handle(cmd, client, alerts).await;
                    let _ = resp_tx.send(response);
                    let _ = resp_tx.send(Response::Loading(false));
                    ctx.request_repaint();
                });
            }
        });
    });
}

async fn handle(cmd: Command, client: TurnosClient, alerts: AlertMediator) -> Response {
    match cmd {
        Command::Identify => match client.identify().await {
            Ok(viewer) => Response::Identity(viewer),
            Err(e) => {
                warn!("Could not identify user: {}", e);
                Response::Identity(Viewer::Member)
            }
        },
        Command::LoadWeek(ticket) => {
            let (start, end) = ticket.range();
            let result = client.get_calendar(start, end).await.map_err(|e| {
                warn!("Calendar fetch failed: {}", e);
                "Error al cargar el calendario de turnos".to_string()
            });
            Response::WeekLoaded { ticket, result }
        }
        Command::Dispatch {
            selection,
            action,
            viewer,
            week,
        } => {
            let dispatcher = BookingDispatcher::new(client, alerts);
            let now = Local::now().naive_local();
            Response::ActionFinished(
                dispatcher
                    .dispatch(&selection, action, viewer, now, week)
                    .await,
            )
        }
        Command::GenerateWeek { viewer, week } => Response::WeekGenerated(
            BookingDispatcher::new(client, alerts)
                .generate_week(viewer, week)
                .await,
        ),
        Command::LoadMembers => match client.list_users().await {
            Ok(users) => Response::MembersLoaded(members_only(users)),
            Err(e) => {
                warn!("Member list failed: {}", e);
                Response::OperationError("Error al cargar la lista de socios".to_string())
            }
        },
    }
}
