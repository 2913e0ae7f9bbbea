use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;

use crate::model::{DaySchedule, Reservation, ReservationState, SlotBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceMark {
    Confirmed,
    Cancelled,
    Finished,
}

impl AttendanceMark {
    fn of(state: ReservationState) -> Self {
        match state {
            ReservationState::Cancelled => AttendanceMark::Cancelled,
            ReservationState::Finished => AttendanceMark::Finished,
            _ => AttendanceMark::Confirmed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceMark::Confirmed => "Confirmado",
            AttendanceMark::Cancelled => "Cancelado",
            AttendanceMark::Finished => "Finalizado",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub slot_id: u64,
    pub member: String,
    pub mark: AttendanceMark,
}

impl AttendanceEntry {
    fn from_reservation(r: &Reservation) -> Option<Self> {
        let member = r
            .member
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| r.member_id.map(|id| format!("#{}", id)))?;
        Some(Self {
            slot_id: r.id,
            member,
            mark: AttendanceMark::of(r.state),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceGroup {
    pub hour: NaiveTime,
    pub entries: Vec<AttendanceEntry>,
}

/// Who held a slot on a past day, grouped by hour.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSheet {
    pub date: NaiveDate,
    pub groups: Vec<AttendanceGroup>,
}

impl AttendanceSheet {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            groups: Vec::new(),
        }
    }

    pub fn for_day(day: &DaySchedule) -> Self {
        Self::collect(day.date, day.hours.iter().map(|h| (h.hour, &h.bundle)))
    }

    pub fn for_cell(date: NaiveDate, hour: NaiveTime, bundle: &SlotBundle) -> Self {
        Self::collect(date, std::iter::once((hour, bundle)))
    }

    fn collect<'a>(
        date: NaiveDate,
        slots: impl Iterator<Item = (NaiveTime, &'a SlotBundle)>,
    ) -> Self {
        let mut by_hour: BTreeMap<NaiveTime, Vec<AttendanceEntry>> = BTreeMap::new();
        for (hour, bundle) in slots {
            let entries = bundle
                .reservations
                .iter()
                .filter_map(AttendanceEntry::from_reservation);
            by_hour.entry(hour).or_default().extend(entries);
        }

        let groups = by_hour
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(hour, entries)| AttendanceGroup { hour, entries })
            .collect();

        Self { date, groups }
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn past_day() -> DaySchedule {
        serde_json::from_value(json!({
            "fecha": "2025-03-10",
            "horarios": [
                {
                    "hora": "18:00",
                    "turnos": [
                        { "id": 4, "estado": "FINALIZADO", "socio": "ana" },
                        { "id": 5, "estado": "DISPONIBLE" },
                        { "id": 6, "estado": "CANCELADO", "socio_id": 12 }
                    ]
                },
                {
                    "hora": "08:00",
                    "turnos": [
                        { "id": 1, "estado": "CONFIRMADO", "socio": "luis" }
                    ]
                },
                {
                    "hora": "10:00",
                    "turnos": [ { "id": 2, "estado": "DISPONIBLE" } ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn groups_by_hour_ascending() {
        let sheet = AttendanceSheet::for_day(&past_day());
        let hours: Vec<_> = sheet.groups.iter().map(|g| g.hour.format("%H:%M").to_string()).collect();
        assert_eq!(hours, vec!["08:00", "18:00"]);
        assert_eq!(sheet.total(), 3);
    }

    #[test]
    fn entries_are_labelled() {
        let sheet = AttendanceSheet::for_day(&past_day());
        let evening = &sheet.groups[1].entries;
        assert_eq!(evening[0].member, "ana");
        assert_eq!(evening[0].mark.label(), "Finalizado");
        assert_eq!(evening[1].member, "#12");
        assert_eq!(evening[1].mark.label(), "Cancelado");
        assert_eq!(sheet.groups[0].entries[0].mark.label(), "Confirmado");
    }

    #[test]
    fn single_cell_sheet() {
        let day = past_day();
        let slot = &day.hours[0];
        let sheet = AttendanceSheet::for_cell(day.date, slot.hour, &slot.bundle);
        assert_eq!(sheet.groups.len(), 1);
        assert_eq!(sheet.total(), 2);

        let empty = &day.hours[2];
        assert!(AttendanceSheet::for_cell(day.date, empty.hour, &empty.bundle).is_empty());
    }
}
