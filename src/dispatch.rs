use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{info, warn};

use crate::alerts::AlertMediator;
use crate::api::TurnosClient;
use crate::calendar::WeekRefresh;
use crate::error::{Result, TurnosError};
use crate::grid::CellActivation;
use crate::model::{ActionReceipt, ReservationState, SlotBundle, Viewer, WeekGeneration, slot_start};
use crate::week::WeekAnchor;

/// Members may cancel a confirmed reservation only while strictly more than
/// this many minutes remain before the slot starts.
pub const CANCEL_NOTICE_MINUTES: i64 = 60;

pub fn cancel_window_open(starts_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    starts_at - now > TimeDelta::minutes(CANCEL_NOTICE_MINUTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Reserve,
    Confirm,
    Cancel,
    ReserveForMember,
    CancelForMember,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Reserve => "Reservar",
            ActionKind::Confirm => "Confirmar",
            ActionKind::Cancel => "Cancelar",
            ActionKind::ReserveForMember => "Reservar para socio",
            ActionKind::CancelForMember => "Cancelar turno del socio",
        }
    }

    pub fn is_staff_only(self) -> bool {
        matches!(self, ActionKind::ReserveForMember | ActionKind::CancelForMember)
    }

    pub fn needs_confirmation(self) -> bool {
        matches!(self, ActionKind::Cancel | ActionKind::CancelForMember)
    }

    fn confirmation_prompt(self) -> &'static str {
        match self {
            ActionKind::CancelForMember => "¿Seguro que deseas cancelar el turno de este socio?",
            _ => "¿Estás seguro de que deseas cancelar este turno?",
        }
    }

    fn default_success(self) -> &'static str {
        match self {
            ActionKind::Reserve => "Turno reservado con éxito.",
            ActionKind::Confirm => "Turno confirmado con éxito.",
            ActionKind::Cancel => "Turno cancelado con éxito.",
            ActionKind::ReserveForMember => "Turno reservado para el socio.",
            ActionKind::CancelForMember => "Turno del socio cancelado.",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            ActionKind::Reserve | ActionKind::ReserveForMember => "Error al reservar el turno.",
            ActionKind::Confirm => "Error al confirmar el turno.",
            ActionKind::Cancel | ActionKind::CancelForMember => "Error al cancelar el turno.",
        }
    }
}

/// An action a selection offers, before any member has been picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAction {
    pub kind: ActionKind,
    pub slot_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Reserve { slot_id: u64 },
    Confirm { slot_id: u64 },
    Cancel { slot_id: u64 },
    ReserveForMember { slot_id: u64, member_id: u64 },
    CancelForMember { slot_id: u64 },
}

impl BookingAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            BookingAction::Reserve { .. } => ActionKind::Reserve,
            BookingAction::Confirm { .. } => ActionKind::Confirm,
            BookingAction::Cancel { .. } => ActionKind::Cancel,
            BookingAction::ReserveForMember { .. } => ActionKind::ReserveForMember,
            BookingAction::CancelForMember { .. } => ActionKind::CancelForMember,
        }
    }

    pub fn slot_id(&self) -> u64 {
        match *self {
            BookingAction::Reserve { slot_id }
            | BookingAction::Confirm { slot_id }
            | BookingAction::Cancel { slot_id }
            | BookingAction::ReserveForMember { slot_id, .. }
            | BookingAction::CancelForMember { slot_id } => slot_id,
        }
    }
}

impl SlotAction {
    /// The concrete action. Reserving for a member needs the member id.
    pub fn with_member(self, member_id: Option<u64>) -> Option<BookingAction> {
        let slot_id = self.slot_id;
        Some(match self.kind {
            ActionKind::Reserve => BookingAction::Reserve { slot_id },
            ActionKind::Confirm => BookingAction::Confirm { slot_id },
            ActionKind::Cancel => BookingAction::Cancel { slot_id },
            ActionKind::ReserveForMember => BookingAction::ReserveForMember {
                slot_id,
                member_id: member_id?,
            },
            ActionKind::CancelForMember => BookingAction::CancelForMember { slot_id },
        })
    }
}

/// The cell the viewer opened: one (date, hour) and its bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSelection {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub bundle: SlotBundle,
}

impl From<CellActivation> for SlotSelection {
    fn from(activation: CellActivation) -> Self {
        Self {
            date: activation.date,
            hour: activation.hour,
            bundle: activation.bundle,
        }
    }
}

impl SlotSelection {
    pub fn starts_at(&self) -> NaiveDateTime {
        slot_start(self.date, self.hour)
    }

    /// Actions the viewer may take on this slot right now.
    pub fn available_actions(&self, viewer: Viewer, now: NaiveDateTime) -> Vec<SlotAction> {
        let starts_at = self.starts_at();
        if !viewer.is_authenticated() || starts_at <= now {
            return Vec::new();
        }

        let offer = |kind, slot_id| SlotAction { kind, slot_id };
        let mut actions = Vec::new();

        for own in self.bundle.own_reservations() {
            match own.state {
                ReservationState::Reserved => {
                    actions.push(offer(ActionKind::Confirm, own.id));
                    actions.push(offer(ActionKind::Cancel, own.id));
                }
                ReservationState::Confirmed if cancel_window_open(starts_at, now) => {
                    actions.push(offer(ActionKind::Cancel, own.id));
                }
                _ => {}
            }
        }

        let unclaimed = self.bundle.first_unclaimed();
        match viewer {
            Viewer::Member => {
                let holds_active = self
                    .bundle
                    .own_reservations()
                    .any(|r| !r.state.is_terminal() && r.state != ReservationState::Available);
                if let Some(slot) = unclaimed.filter(|_| !holds_active) {
                    actions.push(offer(ActionKind::Reserve, slot.id));
                }
            }
            Viewer::Staff => {
                if let Some(slot) = unclaimed {
                    actions.push(offer(ActionKind::ReserveForMember, slot.id));
                }
                for claimed in self
                    .bundle
                    .reservations
                    .iter()
                    .filter(|r| r.is_claimed() && r.state == ReservationState::Confirmed)
                {
                    actions.push(offer(ActionKind::CancelForMember, claimed.id));
                }
            }
            Viewer::Guest => {}
        }

        actions
    }

    /// Check `action` against the same rules that decide which actions are offered.
    pub fn authorize(&self, action: &BookingAction, viewer: Viewer, now: NaiveDateTime) -> Result<()> {
        let kind = action.kind();
        let slot_id = action.slot_id();
        if self
            .available_actions(viewer, now)
            .iter()
            .any(|a| a.kind == kind && a.slot_id == slot_id)
        {
            return Ok(());
        }

        let reason = if !viewer.is_authenticated() {
            "Debes iniciar sesión para realizar esta acción."
        } else if kind.is_staff_only() && !viewer.is_staff() {
            "Solo el personal del gimnasio puede realizar esta acción."
        } else if self.starts_at() <= now {
            "El turno ya comenzó."
        } else if kind == ActionKind::Cancel && self.holds_confirmed(slot_id) {
            "Ya no puedes cancelar este turno (menos de 1 hora)."
        } else {
            "La acción no está disponible para este turno."
        };
        Err(TurnosError::Rejected(reason.to_string()))
    }

    fn holds_confirmed(&self, slot_id: u64) -> bool {
        self.bundle
            .own_reservations()
            .any(|r| r.id == slot_id && r.state == ReservationState::Confirmed)
    }
}

/// Turn an action error into the message shown to the user.
pub fn user_message(err: &TurnosError, kind: ActionKind) -> String {
    describe_error(err, kind.failure_message())
}

fn describe_error(err: &TurnosError, fallback: &str) -> String {
    match err {
        TurnosError::Api {
            detail: Some(detail),
            ..
        } => detail.clone(),
        TurnosError::Request(_) => {
            "No se pudo conectar con el servidor. Intenta nuevamente.".to_string()
        }
        TurnosError::Auth(_) => "Tu sesión expiró. Inicia sesión nuevamente.".to_string(),
        TurnosError::Rejected(reason) => reason.clone(),
        _ => fallback.to_string(),
    }
}

pub fn success_message(kind: ActionKind, receipt: &ActionReceipt) -> String {
    let base = receipt
        .detail
        .clone()
        .unwrap_or_else(|| kind.default_success().to_string());
    match receipt.remaining_classes {
        Some(n) => format!("{} Te quedan {} clases este mes.", base, n),
        None => base,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed {
        message: String,
        remaining_classes: Option<u32>,
    },
    /// The backend or the transport failed.
    Failed { message: String },
    /// Refused before anything was sent.
    Rejected { message: String },
    /// The user declined the confirmation prompt.
    Declined,
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub action: BookingAction,
    pub outcome: DispatchOutcome,
    /// The detail view that launched the action should close.
    pub close_view: bool,
    /// Present whenever the backend was contacted.
    pub refresh: Option<WeekRefresh>,
}

/// Outcome of generating the slots of a week.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub week: WeekAnchor,
    pub outcome: DispatchOutcome,
    pub generation: Option<WeekGeneration>,
    /// Present whenever the backend was contacted.
    pub refresh: Option<WeekRefresh>,
}

/// Confirmation text for generating `week`: Monday through Saturday, the
/// days the gym opens.
pub fn generation_prompt(week: WeekAnchor) -> String {
    let saturday = week.end() - TimeDelta::days(1);
    format!(
        "¿Generar turnos para la semana del {} al {}?",
        week.start().format("%d/%m/%Y"),
        saturday.format("%d/%m/%Y")
    )
}

/// Runs booking actions against the backend and reports the outcome through
/// the alert mediator. Every action that reaches the backend is followed by a
/// calendar re-fetch, whether it succeeded or not.
#[derive(Clone)]
pub struct BookingDispatcher {
    client: TurnosClient,
    alerts: AlertMediator,
}

impl BookingDispatcher {
    pub fn new(client: TurnosClient, alerts: AlertMediator) -> Self {
        Self { client, alerts }
    }

    pub fn alerts(&self) -> &AlertMediator {
        &self.alerts
    }

    pub async fn dispatch(
        &self,
        selection: &SlotSelection,
        action: BookingAction,
        viewer: Viewer,
        now: NaiveDateTime,
        week: WeekAnchor,
    ) -> DispatchReport {
        let kind = action.kind();

        if let Err(err) = selection.authorize(&action, viewer, now) {
            let message = user_message(&err, kind);
            info!("{:?} on slot {} rejected: {}", kind, action.slot_id(), message);
            self.alerts.warning(&message);
            return DispatchReport {
                action,
                outcome: DispatchOutcome::Rejected { message },
                close_view: false,
                refresh: None,
            };
        }

        if kind.needs_confirmation()
            && !self
                .alerts
                .confirm(kind.confirmation_prompt(), "Sí, cancelar", "No")
                .await
        {
            info!("{:?} on slot {} declined", kind, action.slot_id());
            return DispatchReport {
                action,
                outcome: DispatchOutcome::Declined,
                close_view: false,
                refresh: None,
            };
        }

        info!("Dispatching {:?} on slot {}", kind, action.slot_id());
        let (outcome, close_view) = match self.send(action).await {
            Ok(receipt) => {
                let message = success_message(kind, &receipt);
                self.alerts.success(&message);
                (
                    DispatchOutcome::Completed {
                        message,
                        remaining_classes: receipt.remaining_classes,
                    },
                    true,
                )
            }
            Err(err) => {
                warn!("{:?} on slot {} failed: {}", kind, action.slot_id(), err);
                let message = user_message(&err, kind);
                self.alerts.error(&message);
                (DispatchOutcome::Failed { message }, false)
            }
        };

        DispatchReport {
            action,
            outcome,
            close_view,
            refresh: Some(self.refetch(week).await),
        }
    }

    /// Create every slot of `week`. Staff only, asks for confirmation first
    /// and re-fetches the week whenever the backend was contacted.
    pub async fn generate_week(&self, viewer: Viewer, week: WeekAnchor) -> GenerationReport {
        let report = |outcome, generation, refresh| GenerationReport {
            week,
            outcome,
            generation,
            refresh,
        };

        if !viewer.is_staff() {
            let message = "Solo el personal del gimnasio puede realizar esta acción.".to_string();
            info!("Week generation for {} rejected: {}", week.start(), message);
            self.alerts.warning(&message);
            return report(DispatchOutcome::Rejected { message }, None, None);
        }

        if !self
            .alerts
            .confirm(&generation_prompt(week), "Sí, generar", "No")
            .await
        {
            info!("Week generation for {} declined", week.start());
            return report(DispatchOutcome::Declined, None, None);
        }

        let (outcome, generation) = match self.client.generate_week(week.start()).await {
            Ok(generation) => {
                let message = generation.summary();
                if !generation.errors.is_empty() {
                    warn!(
                        "Week generation for {} reported {} errors",
                        week.start(),
                        generation.errors.len()
                    );
                }
                self.alerts.success(&message);
                (
                    DispatchOutcome::Completed {
                        message,
                        remaining_classes: None,
                    },
                    Some(generation),
                )
            }
            Err(err) => {
                warn!("Week generation for {} failed: {}", week.start(), err);
                let message = describe_error(&err, "Error al generar turnos de la semana.");
                self.alerts.error(&message);
                (DispatchOutcome::Failed { message }, None)
            }
        };

        report(outcome, generation, Some(self.refetch(week).await))
    }

    async fn send(&self, action: BookingAction) -> Result<ActionReceipt> {
        match action {
            BookingAction::Reserve { slot_id } => self.client.reserve(slot_id).await,
            BookingAction::Confirm { slot_id } => self.client.confirm(slot_id).await,
            BookingAction::Cancel { slot_id } => self.client.cancel(slot_id).await,
            BookingAction::ReserveForMember { slot_id, member_id } => {
                self.client.reserve_for_member(slot_id, member_id).await
            }
            BookingAction::CancelForMember { slot_id } => {
                self.client.cancel_for_member(slot_id).await
            }
        }
    }

    async fn refetch(&self, week: WeekAnchor) -> WeekRefresh {
        let sequence = WeekRefresh::next_sequence();
        let result = self
            .client
            .get_calendar(week.start(), week.end())
            .await
            .map_err(|e| {
                warn!("Calendar refresh after action failed: {}", e);
                e.to_string()
            });
        WeekRefresh {
            anchor: week,
            sequence,
            result,
        }
    }
}
