use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single reservation.
///
/// Available -> Reserved -> Confirmed -> Finished | Cancelled. Finished and
/// Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    #[serde(rename = "DISPONIBLE", alias = "SOLICITUD")]
    Available,
    #[serde(rename = "RESERVADO")]
    Reserved,
    #[serde(rename = "CONFIRMADO")]
    Confirmed,
    #[serde(rename = "CANCELADO", alias = "ANULADO")]
    Cancelled,
    #[serde(rename = "FINALIZADO")]
    Finished,
}

impl ReservationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "DISPONIBLE",
            Self::Reserved => "RESERVADO",
            Self::Confirmed => "CONFIRMADO",
            Self::Cancelled => "CANCELADO",
            Self::Finished => "FINALIZADO",
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The backend reports the holder either by username or by numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    Id(u64),
    Name(String),
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Id(id) => write!(f, "#{}", id),
            MemberRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: u64,
    #[serde(rename = "estado")]
    pub state: ReservationState,
    #[serde(rename = "es_mio", default)]
    pub is_mine: bool,
    #[serde(rename = "socio", default)]
    pub member: Option<MemberRef>,
    #[serde(rename = "socio_id", default)]
    pub member_id: Option<u64>,
}

impl Reservation {
    pub fn is_claimed(&self) -> bool {
        self.member.is_some() || self.member_id.is_some()
    }

    pub fn is_unclaimed(&self) -> bool {
        self.state == ReservationState::Available && !self.is_claimed()
    }
}

fn default_total_slots() -> u32 {
    10
}

/// Server-reported aggregate for one (date, hour) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotBundle {
    #[serde(rename = "cupos_disponibles", default)]
    pub available: u32,
    #[serde(rename = "total_cupos", default = "default_total_slots")]
    pub total: u32,
    #[serde(rename = "cupos_bloqueados", default)]
    pub blocked: u32,
    #[serde(rename = "cupos_reservados", default)]
    pub reserved: u32,
    #[serde(rename = "cupos_confirmados", default)]
    pub confirmed: u32,
    #[serde(rename = "turnos", default)]
    pub reservations: Vec<Reservation>,
}

impl SlotBundle {
    pub fn own_reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter().filter(|r| r.is_mine)
    }

    /// True if the viewer holds a reservation in `state` for this cell.
    pub fn holds(&self, state: ReservationState) -> bool {
        self.own_reservations().any(|r| r.state == state)
    }

    pub fn first_unclaimed(&self) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.is_unclaimed())
    }

    /// True if at least `percent`% of the configured capacity is still free.
    pub fn free_share_at_least(&self, percent: u32) -> bool {
        self.total > 0 && u64::from(self.available) * 100 >= u64::from(percent) * u64::from(self.total)
    }
}

/// One hour row of a day in the weekly calendar payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSchedule {
    #[serde(rename = "hora", with = "hour_label")]
    pub hour: NaiveTime,
    #[serde(flatten)]
    pub bundle: SlotBundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "horarios", default)]
    pub hours: Vec<HourSchedule>,
}

/// Body returned by the reservation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionReceipt {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(rename = "clases_restantes", default)]
    pub remaining_classes: Option<u32>,
}

/// Body returned when staff generate the slots of a week.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeekGeneration {
    #[serde(rename = "turnos_creados", default)]
    pub created: u32,
    #[serde(rename = "turnos_existentes", default)]
    pub existing: u32,
    #[serde(rename = "errores", default)]
    pub errors: Vec<serde_json::Value>,
}

impl WeekGeneration {
    pub fn summary(&self) -> String {
        let mut text = match self.created {
            1 => "Se creó 1 turno.".to_string(),
            n => format!("Se crearon {} turnos.", n),
        };
        if self.existing > 0 {
            text.push_str(&format!(" {} ya existían.", self.existing));
        }
        if !self.errors.is_empty() {
            text.push_str(&format!(" {} con errores.", self.errors.len()));
        }
        text
    }
}

/// One reservation as listed by the flat slot endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlotRecord {
    pub id: u64,
    #[serde(rename = "hora_inicio", with = "start_time")]
    pub starts_at: NaiveDateTime,
    #[serde(rename = "estado")]
    pub state: ReservationState,
    #[serde(rename = "socio", default)]
    pub member_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "trainer")]
    Entrenador,
    #[serde(alias = "member")]
    Socio,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Entrenador)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "rol", alias = "perfil__rol", default)]
    pub role: Option<Role>,
}

/// Who is looking at the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Guest,
    Member,
    Staff,
}

impl Viewer {
    pub fn from_role(role: Option<Role>) -> Self {
        match role {
            Some(r) if r.is_staff() => Viewer::Staff,
            _ => Viewer::Member,
        }
    }

    pub fn is_staff(self) -> bool {
        self == Viewer::Staff
    }

    pub fn is_authenticated(self) -> bool {
        self != Viewer::Guest
    }
}

/// Start of the one-hour slot at `hour` on `date`.
pub fn slot_start(date: NaiveDate, hour: NaiveTime) -> NaiveDateTime {
    date.and_time(hour)
}

pub mod hour_label {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, FORMAT))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid hour label '{}'", s)))
    }
}

/// `hora_inicio` timestamps: RFC 3339 with an offset (converted to local
/// time) or a naive `YYYY-MM-DDTHH:MM[:SS]`.
pub mod start_time {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Local).naive_local());
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .ok()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid start time '{}'", s)))
    }
}
