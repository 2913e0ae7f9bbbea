use chrono::NaiveDateTime;

use crate::model::{ReservationState, SlotRecord};

/// How many upcoming reservations the summary lists.
pub const UPCOMING_LIMIT: usize = 3;

/// The member's next reservations: pending or confirmed, starting after
/// `now`, soonest first, at most `UPCOMING_LIMIT`.
pub fn upcoming(records: &[SlotRecord], member_id: u64, now: NaiveDateTime) -> Vec<&SlotRecord> {
    let mut mine: Vec<&SlotRecord> = records
        .iter()
        .filter(|r| r.member_id == Some(member_id))
        .filter(|r| matches!(r.state, ReservationState::Reserved | ReservationState::Confirmed))
        .filter(|r| r.starts_at > now)
        .collect();
    mine.sort_by_key(|r| (r.starts_at, r.id));
    mine.truncate(UPCOMING_LIMIT);
    mine
}
