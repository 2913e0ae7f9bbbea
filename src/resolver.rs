//! Derives the visual and interaction state of one calendar cell.
//!
//! The rules are evaluated in a fixed priority order and the first match wins:
//! closures (Sunday, Saturday midday), elapsed time, missing schedule,
//! administrative holds, the viewer's own reservation, then free capacity.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::model::{ReservationState, SlotBundle, Viewer};

/// Saturday hours in `[start, end)` are closed.
pub const SATURDAY_BREAK: (u32, u32) = (12, 17);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    Sunday,
    SaturdayBreak,
    NoSchedule,
}

/// Cosmetic tier of a bookable cell, by free share of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// 70% or more free
    Plenty,
    /// 40% or more free
    Moderate,
    Few,
}

impl Occupancy {
    fn of(bundle: &SlotBundle) -> Self {
        if bundle.free_share_at_least(70) {
            Occupancy::Plenty
        } else if bundle.free_share_at_least(40) {
            Occupancy::Moderate
        } else {
            Occupancy::Few
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Closed(ClosedReason),
    Finalized,
    Attendance,
    Unavailable,
    Confirmed,
    Pending,
    Bookable {
        free: u32,
        total: u32,
        occupancy: Occupancy,
    },
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub status: CellStatus,
    pub clickable: bool,
}

impl CellView {
    fn fixed(status: CellStatus) -> Self {
        Self {
            status,
            clickable: false,
        }
    }

    fn open(status: CellStatus) -> Self {
        Self {
            status,
            clickable: true,
        }
    }

    /// Activating this cell opens the attendance history instead of the booking view.
    pub fn is_history(&self) -> bool {
        self.status == CellStatus::Attendance
    }

    pub fn style_class(&self) -> &'static str {
        match self.status {
            CellStatus::Closed(_) => "closed",
            CellStatus::Finalized => "finalized",
            CellStatus::Attendance => "attendance",
            CellStatus::Unavailable => "unavailable",
            CellStatus::Confirmed => "confirmed",
            CellStatus::Pending => "pending",
            CellStatus::Bookable { occupancy, .. } => match occupancy {
                Occupancy::Plenty => "bookable-high",
                Occupancy::Moderate => "bookable-medium",
                Occupancy::Few => "bookable-low",
            },
            CellStatus::Full => "full",
        }
    }

    pub fn label(&self) -> String {
        match self.status {
            CellStatus::Closed(ClosedReason::NoSchedule) => "Sin cupos".to_string(),
            CellStatus::Closed(_) => "Cerrado".to_string(),
            CellStatus::Finalized => "-".to_string(),
            CellStatus::Attendance => "Ver asistencia".to_string(),
            CellStatus::Unavailable => "No disponible".to_string(),
            CellStatus::Confirmed => "✓".to_string(),
            CellStatus::Pending => "⏱".to_string(),
            CellStatus::Bookable { free, total, .. } => format!("{}/{}", free, total),
            CellStatus::Full => "Completo".to_string(),
        }
    }
}

enum Position {
    DayEnded,
    HourElapsed,
    Upcoming,
}

fn position(date: NaiveDate, hour: NaiveTime, now: NaiveDateTime) -> Position {
    let day_end = date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN));
    if day_end < now {
        Position::DayEnded
    } else if date.and_time(hour) < now {
        Position::HourElapsed
    } else {
        Position::Upcoming
    }
}

fn in_saturday_break(hour: NaiveTime) -> bool {
    let (start, end) = SATURDAY_BREAK;
    (start..end).contains(&hour.hour())
}

/// Resolve the state of the cell at (`date`, `hour`).
///
/// Pure: identical inputs always produce identical output.
pub fn resolve(
    date: NaiveDate,
    hour: NaiveTime,
    bundle: Option<&SlotBundle>,
    viewer: Viewer,
    now: NaiveDateTime,
) -> CellView {
    match date.weekday() {
        Weekday::Sun => return CellView::fixed(CellStatus::Closed(ClosedReason::Sunday)),
        Weekday::Sat if in_saturday_break(hour) => {
            return CellView::fixed(CellStatus::Closed(ClosedReason::SaturdayBreak));
        }
        _ => {}
    }

    // Day granularity is checked before hour granularity; both share the
    // staff/member branching.
    match (position(date, hour, now), bundle) {
        (Position::DayEnded, Some(b)) | (Position::HourElapsed, Some(b)) => past(viewer, b),
        (Position::DayEnded, None) | (Position::HourElapsed, None) => {
            CellView::fixed(CellStatus::Finalized)
        }
        (Position::Upcoming, None) => CellView::fixed(CellStatus::Closed(ClosedReason::NoSchedule)),
        (Position::Upcoming, Some(b)) => upcoming(b),
    }
}

fn past(viewer: Viewer, bundle: &SlotBundle) -> CellView {
    match viewer {
        Viewer::Staff => CellView::open(CellStatus::Attendance),
        Viewer::Member | Viewer::Guest if bundle.holds(ReservationState::Finished) => {
            CellView::open(CellStatus::Attendance)
        }
        Viewer::Member | Viewer::Guest => CellView::fixed(CellStatus::Finalized),
    }
}

fn upcoming(bundle: &SlotBundle) -> CellView {
    if bundle.blocked > 0 {
        return CellView::fixed(CellStatus::Unavailable);
    }
    if bundle.holds(ReservationState::Confirmed) {
        return CellView::open(CellStatus::Confirmed);
    }
    if bundle.holds(ReservationState::Reserved) {
        return CellView::open(CellStatus::Pending);
    }
    if bundle.available > 0 {
        return CellView::open(CellStatus::Bookable {
            free: bundle.available,
            total: bundle.total,
            occupancy: Occupancy::of(bundle),
        });
    }
    CellView::open(CellStatus::Full)
}
