use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::collections::HashMap;

use crate::model::{DaySchedule, SlotBundle, Viewer};
use crate::resolver::{self, CellView};
use crate::week::WeekAnchor;

pub const FIRST_HOUR: u32 = 8;
pub const HOUR_ROWS: u32 = 15;

/// Row labels of the grid: 08:00 through 22:00.
pub fn hour_rows() -> Vec<NaiveTime> {
    (FIRST_HOUR..FIRST_HOUR + HOUR_ROWS)
        .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
        .collect()
}

#[derive(Debug, Clone)]
pub struct DayHeader {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_sunday: bool,
}

#[derive(Debug, Clone)]
pub struct GridCell {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub view: CellView,
    pub bundle: Option<SlotBundle>,
}

#[derive(Debug, Clone)]
pub struct GridRow {
    pub hour: NaiveTime,
    pub cells: Vec<GridCell>,
}

/// What a clickable cell hands to whoever opens the detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct CellActivation {
    pub date: NaiveDate,
    pub hour: NaiveTime,
    pub bundle: SlotBundle,
    pub history: bool,
}

#[derive(Debug, Clone)]
pub struct CalendarGrid {
    pub anchor: WeekAnchor,
    pub days: Vec<DayHeader>,
    pub rows: Vec<GridRow>,
}

impl CalendarGrid {
    /// Pair every (day, hour) of the week with its slot bundle and resolve it.
    ///
    /// Days or hours missing from `payload` resolve as cells without a bundle.
    /// Duplicate entries keep the first occurrence.
    pub fn build(
        anchor: WeekAnchor,
        payload: &[DaySchedule],
        viewer: Viewer,
        now: NaiveDateTime,
    ) -> Self {
        let mut index: HashMap<(NaiveDate, NaiveTime), &SlotBundle> = HashMap::new();
        for day in payload {
            for slot in &day.hours {
                index.entry((day.date, slot.hour)).or_insert(&slot.bundle);
            }
        }

        let today = now.date();
        let days = anchor
            .days()
            .map(|date| DayHeader {
                date,
                is_today: date == today,
                is_sunday: date.weekday() == Weekday::Sun,
            })
            .collect();

        let rows = hour_rows()
            .into_iter()
            .map(|hour| GridRow {
                hour,
                cells: anchor
                    .days()
                    .map(|date| {
                        let bundle = index.get(&(date, hour)).copied();
                        GridCell {
                            date,
                            hour,
                            view: resolver::resolve(date, hour, bundle, viewer, now),
                            bundle: bundle.cloned(),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { anchor, days, rows }
    }

    pub fn cell(&self, date: NaiveDate, hour: NaiveTime) -> Option<&GridCell> {
        self.rows
            .iter()
            .find(|r| r.hour == hour)?
            .cells
            .iter()
            .find(|c| c.date == date)
    }

    /// Activate the cell at (`date`, `hour`). Non-clickable cells and cells
    /// without a bundle yield nothing.
    pub fn activate(&self, date: NaiveDate, hour: NaiveTime) -> Option<CellActivation> {
        self.cell(date, hour)?.activation()
    }
}

impl GridCell {
    pub fn activation(&self) -> Option<CellActivation> {
        if !self.view.clickable {
            return None;
        }
        let bundle = self.bundle.clone()?;
        Some(CellActivation {
            date: self.date,
            hour: self.hour,
            bundle,
            history: self.view.is_history(),
        })
    }
}
