use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::grid::CalendarGrid;
use crate::model::{DaySchedule, Viewer};
use crate::week::{WeekAnchor, WeekStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// The week changed or the user asked to retry; the grid shows a loading state.
    Navigate,
    /// Re-fetch after an action; the current grid stays visible.
    Refresh,
}

/// Tag attached to every weekly fetch so late responses can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub anchor: WeekAnchor,
    pub generation: u64,
    pub kind: FetchKind,
}

impl FetchTicket {
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.anchor.start(), self.anchor.end())
    }
}

static REFRESH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Calendar re-fetched after a booking action, for the week it was fetched for.
///
/// `sequence` is taken when the re-fetch starts, so a larger sequence always
/// carries data at least as recent as a smaller one.
#[derive(Debug, Clone)]
pub struct WeekRefresh {
    pub anchor: WeekAnchor,
    pub sequence: u64,
    pub result: std::result::Result<Vec<DaySchedule>, String>,
}

impl WeekRefresh {
    pub fn next_sequence() -> u64 {
        REFRESH_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub enum WeekData {
    Loading,
    Ready(Vec<DaySchedule>),
    Failed(String),
}

/// The displayed week and whatever the backend last said about it.
#[derive(Debug)]
pub struct CalendarSession {
    anchor: WeekAnchor,
    generation: u64,
    last_refresh: u64,
    data: WeekData,
}

impl CalendarSession {
    pub fn new(anchor: WeekAnchor) -> Self {
        Self {
            anchor,
            generation: 0,
            last_refresh: 0,
            data: WeekData::Loading,
        }
    }

    pub fn anchor(&self) -> WeekAnchor {
        self.anchor
    }

    pub fn data(&self) -> &WeekData {
        &self.data
    }

    fn issue(&mut self, kind: FetchKind) -> FetchTicket {
        self.generation += 1;
        if kind == FetchKind::Navigate {
            self.data = WeekData::Loading;
        }
        FetchTicket {
            anchor: self.anchor,
            generation: self.generation,
            kind,
        }
    }

    /// Initial load, or a retry after a failed load.
    pub fn load(&mut self) -> FetchTicket {
        self.issue(FetchKind::Navigate)
    }

    pub fn retry(&mut self) -> FetchTicket {
        self.load()
    }

    /// Re-fetch the current week without hiding the grid.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue(FetchKind::Refresh)
    }

    pub fn step(&mut self, step: WeekStep) -> FetchTicket {
        self.anchor.advance(step);
        self.issue(FetchKind::Navigate)
    }

    pub fn go_to_today(&mut self, today: NaiveDate) -> FetchTicket {
        self.anchor.reset_to(today);
        self.issue(FetchKind::Navigate)
    }

    /// True if a response for `ticket` would still be shown.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.anchor == self.anchor && ticket.generation == self.generation
    }

    /// Store the outcome of a fetch. Returns false when the ticket was
    /// superseded and the result discarded.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<DaySchedule>, String>,
    ) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                "Discarding calendar for {} (generation {}), showing {} (generation {})",
                ticket.anchor.start(),
                ticket.generation,
                self.anchor.start(),
                self.generation
            );
            return false;
        }

        match result {
            Ok(days) => self.data = WeekData::Ready(days),
            Err(message) => match (&self.data, ticket.kind) {
                (WeekData::Ready(_), FetchKind::Refresh) => {
                    warn!("Calendar refresh failed, keeping previous data: {}", message);
                }
                _ => self.data = WeekData::Failed(message),
            },
        }
        true
    }

    /// Store a post-action refresh. Refreshes for a week that is no longer
    /// displayed, or older than one already applied, are discarded; failures
    /// never replace data already shown.
    pub fn apply_refresh(&mut self, refresh: WeekRefresh) -> bool {
        if refresh.anchor != self.anchor {
            debug!(
                "Discarding refresh for {}, showing {}",
                refresh.anchor.start(),
                self.anchor.start()
            );
            return false;
        }
        if refresh.sequence <= self.last_refresh {
            debug!(
                "Discarding refresh {} for {}, already applied {}",
                refresh.sequence,
                refresh.anchor.start(),
                self.last_refresh
            );
            return false;
        }
        self.last_refresh = refresh.sequence;

        match (refresh.result, &self.data) {
            (Ok(days), _) => self.data = WeekData::Ready(days),
            (Err(message), WeekData::Failed(_)) => self.data = WeekData::Failed(message),
            (Err(message), _) => warn!("Calendar refresh failed: {}", message),
        }
        true
    }

    pub fn grid(&self, viewer: Viewer, now: NaiveDateTime) -> Option<CalendarGrid> {
        match &self.data {
            WeekData::Ready(days) => Some(CalendarGrid::build(self.anchor, days, viewer, now)),
            _ => None,
        }
    }
}
