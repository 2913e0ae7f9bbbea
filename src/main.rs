use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use tracing::info;

use gym_turnos::alerts::{AlertKind, AlertMediator};
use gym_turnos::api::TurnosClient;
use gym_turnos::attendance::AttendanceSheet;
use gym_turnos::config::Config;
use gym_turnos::dispatch::{ActionKind, BookingDispatcher, DispatchOutcome, SlotAction, SlotSelection};
use gym_turnos::error::{Result, TurnosError};
use gym_turnos::grid::CalendarGrid;
use gym_turnos::members::{members_only, search};
use gym_turnos::model::{ReservationState, Viewer, hour_label};
use gym_turnos::upcoming::upcoming;
use gym_turnos::util::{day_header, format_duration, truncate};
use gym_turnos::week::WeekAnchor;

#[derive(Parser)]
#[command(name = "gym_turnos")]
#[command(about = "Weekly class calendar and reservations for the gym")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Accept confirmation prompts without asking
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test login credentials and show the role
    Login,
    /// Show the weekly calendar grid
    Week {
        /// Weeks from the current one (negative for past weeks)
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },
    /// Show one slot and the actions available on it
    Slot {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
    },
    /// Reserve a place in a slot
    Reserve {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
    },
    /// Confirm your pending reservation
    Confirm {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
    },
    /// Cancel your reservation
    Cancel {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
    },
    /// Reserve a place for a member (staff)
    ReserveFor {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
        member_id: u64,
    },
    /// Cancel a member's reservation (staff)
    CancelFor {
        slot_id: u64,
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: NaiveTime,
    },
    /// List members, optionally filtered by username or email (staff)
    Members { query: Option<String> },
    /// Create every slot of the week containing a date (staff)
    GenerateWeek {
        /// Any day of the week to generate, today by default
        date: Option<NaiveDate>,
    },
    /// Show your next reservations
    Mine,
    /// Show who attended on a past day or hour
    Attendance {
        date: NaiveDate,
        #[arg(value_parser = parse_hour)]
        hour: Option<NaiveTime>,
    },
}

fn parse_hour(s: &str) -> std::result::Result<NaiveTime, String> {
    hour_label::parse(s)
        .or_else(|| {
            s.parse::<u32>()
                .ok()
                .and_then(|h| NaiveTime::from_hms_opt(h, 0, 0))
        })
        .ok_or_else(|| format!("invalid hour '{}', expected HH:MM", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gym_turnos=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let client = TurnosClient::new(&config)?;
    let alerts = AlertMediator::new(config.alerts.notice_timeout());

    match cli.command {
        Commands::Login => {
            info!("Testing login...");
            let client = client.login().await?;
            let user = client.current_user().await?;
            info!("Login successful!");
            println!(
                "\n{} ({})",
                user.username,
                match Viewer::from_role(user.role) {
                    Viewer::Staff => "staff",
                    _ => "socio",
                }
            );
        }
        Commands::Week { offset } => {
            let anchor = WeekAnchor::current().shifted(offset).ok_or_else(|| {
                TurnosError::Rejected(format!("La semana {:+} está fuera de rango", offset))
            })?;
            let client = client.login().await?;
            let viewer = client.identify().await?;
            info!("Fetching week {}", anchor);
            let days = client.get_calendar(anchor.start(), anchor.end()).await?;
            print_week(&CalendarGrid::build(anchor, &days, viewer, now()));
        }
        Commands::Slot { date, hour } => {
            let client = client.login().await?;
            let viewer = client.identify().await?;
            let now = now();
            let selection = load_selection(&client, date, hour, viewer, now).await?;
            print_slot(&selection, viewer, now);
        }
        Commands::Reserve { date, hour } => {
            run_action(&client, &alerts, cli.yes, date, hour, ActionKind::Reserve, None).await?;
        }
        Commands::Confirm { date, hour } => {
            run_action(&client, &alerts, cli.yes, date, hour, ActionKind::Confirm, None).await?;
        }
        Commands::Cancel { date, hour } => {
            run_action(&client, &alerts, cli.yes, date, hour, ActionKind::Cancel, None).await?;
        }
        Commands::ReserveFor {
            date,
            hour,
            member_id,
        } => {
            run_action(
                &client,
                &alerts,
                cli.yes,
                date,
                hour,
                ActionKind::ReserveForMember,
                Some(member_id),
            )
            .await?;
        }
        Commands::CancelFor {
            slot_id,
            date,
            hour,
        } => {
            run_action(
                &client,
                &alerts,
                cli.yes,
                date,
                hour,
                ActionKind::CancelForMember,
                Some(slot_id),
            )
            .await?;
        }
        Commands::Members { query } => {
            let client = client.login().await?;
            let members = members_only(client.list_users().await?);
            let found = search(&members, query.as_deref().unwrap_or(""));

            if found.is_empty() {
                println!("\nNo se encontraron socios.");
            } else {
                println!("\n{:<8} {:<20} {:<30}", "ID", "Usuario", "Email");
                println!("{}", "-".repeat(58));
                for member in found {
                    println!(
                        "{:<8} {:<20} {:<30}",
                        member.id,
                        truncate(&member.username, 18),
                        truncate(member.email.as_deref().unwrap_or("-"), 28)
                    );
                }
            }
        }
        Commands::GenerateWeek { date } => {
            let client = client.login().await?;
            let viewer = client.identify().await?;
            let week = WeekAnchor::containing(date.unwrap_or_else(|| now().date()));

            let console = spawn_confirmations(alerts.clone(), cli.yes);
            let report = BookingDispatcher::new(client, alerts.clone())
                .generate_week(viewer, week)
                .await;
            console.abort();

            match report.outcome {
                DispatchOutcome::Completed { message, .. } => println!("\n{}", message),
                DispatchOutcome::Declined => println!("\nOperación cancelada."),
                DispatchOutcome::Failed { message } | DispatchOutcome::Rejected { message } => {
                    return Err(TurnosError::Rejected(message));
                }
            }
            if let Some(Ok(days)) = report.refresh.map(|r| r.result) {
                print_week(&CalendarGrid::build(week, &days, viewer, now()));
            }
        }
        Commands::Mine => {
            let client = client.login().await?;
            let user = client.current_user().await?;
            let records = client.list_slots().await?;
            let next = upcoming(&records, user.id, now());

            if next.is_empty() {
                println!("\nNo tienes turnos reservados próximamente.");
            } else {
                println!("\n{:<8} {:<18} {:<8} {:<12}", "ID", "Día", "Hora", "Estado");
                println!("{}", "-".repeat(48));
                for record in next {
                    let state = match record.state {
                        ReservationState::Confirmed => "Confirmado",
                        _ => "Pendiente",
                    };
                    println!(
                        "{:<8} {:<18} {:<8} {:<12}",
                        record.id,
                        day_header(record.starts_at.date()),
                        record.starts_at.format("%H:%M").to_string(),
                        state
                    );
                }
            }
        }
        Commands::Attendance { date, hour } => {
            let client = client.login().await?;
            let days = client.get_calendar(date, date).await?;
            let day = days.iter().find(|d| d.date == date);

            let sheet = match (day, hour) {
                (Some(day), None) => AttendanceSheet::for_day(day),
                (Some(day), Some(hour)) => day
                    .hours
                    .iter()
                    .find(|h| h.hour == hour)
                    .map(|slot| AttendanceSheet::for_cell(date, hour, &slot.bundle))
                    .unwrap_or_else(|| AttendanceSheet::empty(date)),
                (None, _) => AttendanceSheet::empty(date),
            };
            print_attendance(&sheet);
        }
    }

    Ok(())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn load_selection(
    client: &TurnosClient,
    date: NaiveDate,
    hour: NaiveTime,
    viewer: Viewer,
    now: NaiveDateTime,
) -> Result<SlotSelection> {
    let anchor = WeekAnchor::containing(date);
    let days = client.get_calendar(anchor.start(), anchor.end()).await?;
    CalendarGrid::build(anchor, &days, viewer, now)
        .activate(date, hour)
        .map(SlotSelection::from)
        .ok_or_else(|| {
            TurnosError::Rejected(format!(
                "El horario {} {} no está disponible",
                date,
                hour.format("%H:%M")
            ))
        })
}

/// Pick the reservation an action applies to. When the slot does not offer
/// the action, a best guess is still returned so the dispatcher can explain
/// the refusal.
fn target_slot(
    selection: &SlotSelection,
    kind: ActionKind,
    viewer: Viewer,
    now: NaiveDateTime,
    explicit: Option<u64>,
) -> u64 {
    if let Some(id) = explicit {
        return id;
    }
    selection
        .available_actions(viewer, now)
        .into_iter()
        .find(|a| a.kind == kind)
        .map(|a| a.slot_id)
        .or_else(|| match kind {
            ActionKind::Reserve | ActionKind::ReserveForMember => {
                selection.bundle.first_unclaimed().map(|r| r.id)
            }
            _ => selection
                .bundle
                .own_reservations()
                .find(|r| !r.state.is_terminal())
                .map(|r| r.id),
        })
        .unwrap_or_default()
}

async fn run_action(
    client: &TurnosClient,
    alerts: &AlertMediator,
    assume_yes: bool,
    date: NaiveDate,
    hour: NaiveTime,
    kind: ActionKind,
    argument: Option<u64>,
) -> Result<()> {
    let client = client.clone().login().await?;
    let viewer = client.identify().await?;
    let now = now();
    let selection = load_selection(&client, date, hour, viewer, now).await?;

    // For CancelForMember the argument names the reservation, for
    // ReserveForMember it names the member.
    let (explicit_slot, member_id) = match kind {
        ActionKind::CancelForMember => (argument, None),
        _ => (None, argument),
    };
    let slot_id = target_slot(&selection, kind, viewer, now, explicit_slot);
    let action = SlotAction { kind, slot_id }
        .with_member(member_id)
        .ok_or_else(|| TurnosError::Rejected("Falta el socio".to_string()))?;

    let console = spawn_confirmations(alerts.clone(), assume_yes);
    let dispatcher = BookingDispatcher::new(client, alerts.clone());
    let report = dispatcher
        .dispatch(&selection, action, viewer, now, WeekAnchor::containing(date))
        .await;
    console.abort();

    match report.outcome {
        DispatchOutcome::Completed { message, .. } => println!("\n{}", message),
        DispatchOutcome::Declined => println!("\nOperación cancelada."),
        DispatchOutcome::Failed { message } | DispatchOutcome::Rejected { message } => {
            return Err(TurnosError::Rejected(message));
        }
    }

    if let Some(Ok(days)) = report.refresh.map(|r| r.result) {
        let grid = CalendarGrid::build(WeekAnchor::containing(date), &days, viewer, now);
        if let Some(selection) = grid.activate(date, hour).map(SlotSelection::from) {
            print_slot(&selection, viewer, now);
        }
    }
    Ok(())
}

/// Answer confirmation alerts on the terminal.
fn spawn_confirmations(alerts: AlertMediator, assume_yes: bool) -> tokio::task::JoinHandle<()> {
    let mut rx = alerts.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let current = rx.borrow_and_update().clone();
            let Some(view) = current else {
                continue;
            };
            if view.kind != AlertKind::Confirm {
                continue;
            }

            let accepted = if assume_yes {
                println!("{} [{}]", view.message, view.confirm_text);
                true
            } else {
                let question = format!(
                    "{} [{}/{}] ",
                    view.message,
                    view.confirm_text,
                    view.cancel_text.as_deref().unwrap_or("No")
                );
                tokio::task::spawn_blocking(move || ask(&question))
                    .await
                    .unwrap_or(false)
            };
            alerts.respond(view.id, accepted);
        }
    })
}

fn ask(question: &str) -> bool {
    print!("{}", question);
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(
        line.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

fn print_week(grid: &CalendarGrid) {
    println!("\nSemana {}", grid.anchor);
    print!("\n{:<7}", "Hora");
    for day in &grid.days {
        let marker = if day.is_today { "*" } else { "" };
        print!("{:<14}", format!("{}{}", day_header(day.date), marker));
    }
    println!();
    println!("{}", "-".repeat(7 + 14 * grid.days.len()));

    for row in &grid.rows {
        print!("{:<7}", row.hour.format("%H:%M").to_string());
        for cell in &row.cells {
            print!("{:<14}", truncate(&cell.view.label(), 13));
        }
        println!();
    }

    println!("\n✓ confirmado   ⏱ pendiente de confirmar   libres/total   * hoy");
}

fn print_slot(selection: &SlotSelection, viewer: Viewer, now: NaiveDateTime) {
    let bundle = &selection.bundle;
    println!(
        "\n{} {}hs",
        day_header(selection.date),
        selection.hour.format("%H:%M")
    );
    let until = selection.starts_at() - now;
    if until > chrono::Duration::zero() {
        println!("Comienza en {}", format_duration(until));
    }
    println!(
        "Disponibles: {}/{}   Reservados: {}   Confirmados: {}",
        bundle.available, bundle.total, bundle.reserved, bundle.confirmed
    );

    let listed: Vec<_> = bundle
        .reservations
        .iter()
        .filter(|r| r.is_mine || (viewer.is_staff() && r.is_claimed()))
        .collect();
    if !listed.is_empty() {
        println!("\n{:<8} {:<20} {:<12}", "ID", "Socio", "Estado");
        println!("{}", "-".repeat(40));
        for r in listed {
            let holder = match (&r.member, r.is_mine) {
                (_, true) => "(vos)".to_string(),
                (Some(member), _) => member.to_string(),
                (None, _) => "-".to_string(),
            };
            println!("{:<8} {:<20} {:<12}", r.id, truncate(&holder, 18), r.state);
        }
    }

    let actions = selection.available_actions(viewer, now);
    if actions.is_empty() {
        println!("\nSin acciones disponibles.");
    } else {
        println!("\nAcciones:");
        for action in actions {
            println!("  {} (turno {})", action.kind.label(), action.slot_id);
        }
    }
}

fn print_attendance(sheet: &AttendanceSheet) {
    println!("\nAsistencia {}", day_header(sheet.date));
    if sheet.is_empty() {
        println!("No hubo asistentes este día.");
        return;
    }
    for group in &sheet.groups {
        println!(
            "\n{}hs ({} asistente{})",
            group.hour.format("%H:%M"),
            group.entries.len(),
            if group.entries.len() == 1 { "" } else { "s" }
        );
        for entry in &group.entries {
            println!(
                "  #{:<7} {:<20} {}",
                entry.slot_id,
                truncate(&entry.member, 18),
                entry.mark.label()
            );
        }
    }
    println!("\nTotal: {}", sheet.total());
}
