//! Free time between calendar events.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Slots are only offered inside these hours.
const DAY_START_HOUR: u32 = 8;
const DAY_END_HOUR: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeSlot {
    /// `HH:MM`
    pub start: String,
    pub end: String,
    pub minutes: i64,
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Gaps of at least `min_minutes` between 08:00 and 22:00 on `date`.
/// `busy` holds `(start, end)` pairs in any order; they may overlap or
/// spill outside the day window.
pub fn free_slots(date: NaiveDate, busy: &[(NaiveDateTime, NaiveDateTime)], min_minutes: i64) -> Vec<FreeSlot> {
    let day_start = at(date, DAY_START_HOUR);
    let day_end = at(date, DAY_END_HOUR);

    let mut busy = busy.to_vec();
    busy.sort_by_key(|(start, _)| *start);

    let mut slots = Vec::new();
    let mut cursor = day_start;
    let mut push = |from: NaiveDateTime, to: NaiveDateTime| {
        let to = to.min(day_end);
        let minutes = (to - from).num_minutes();
        if minutes >= min_minutes && minutes > 0 {
            slots.push(FreeSlot {
                start: from.format("%H:%M").to_string(),
                end: to.format("%H:%M").to_string(),
                minutes,
            });
        }
    };

    for (start, end) in busy {
        push(cursor, start);
        cursor = cursor.max(end);
    }
    push(cursor, day_end);
    slots
}
