use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStep {
    Previous,
    Next,
}

impl WeekStep {
    fn weeks(self) -> i64 {
        match self {
            WeekStep::Previous => -1,
            WeekStep::Next => 1,
        }
    }
}

/// Monday of the displayed ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekAnchor(NaiveDate);

impl WeekAnchor {
    /// Anchor of the ISO week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        Self(date - Duration::days(offset))
    }

    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    /// Move one week. At the edge of the representable calendar the anchor
    /// stays where it is.
    pub fn advance(&mut self, step: WeekStep) {
        if let Some(next) = self.shifted(step.weeks()) {
            *self = next;
        }
    }

    pub fn reset_to(&mut self, today: NaiveDate) {
        *self = Self::containing(today);
    }

    /// The anchor `weeks` away, or `None` if that week (through its Sunday)
    /// falls outside the supported date range.
    pub fn shifted(self, weeks: i64) -> Option<Self> {
        let start = Duration::try_weeks(weeks).and_then(|d| self.0.checked_add_signed(d))?;
        start.checked_add_signed(Duration::days(6))?;
        Some(Self(start))
    }

    pub fn start(self) -> NaiveDate {
        self.0
    }

    /// Sunday closing the week.
    pub fn end(self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        (0..7).map(move |i| self.0 + Duration::days(i))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }
}

impl fmt::Display for WeekAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start().format("%d %b"),
            self.end().format("%d %b %Y")
        )
    }
}
