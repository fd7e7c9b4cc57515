//! Deterministic planning for the student persona.
//!
//! Nothing here calls a model. Crisis catch-up and day plans are rule
//! tables over a few workload signals, [`intent`] is the keyword fallback
//! the coordinator uses when no model is configured, and the rest are small
//! scheduling calculations behind the task and calendar endpoints.
//!
//! Functions that depend on the clock take `now` or `today` as an argument.

pub mod crisis;
pub mod day;
pub mod intent;
pub mod prioritize;
pub mod review;
pub mod slots;

mod signals;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::toon::schemas::{Task, TaskStatus};

pub use crisis::{CatchupPlan, CatchupRequest, plan_catchup};
pub use day::{DayPlan, DayRequest, plan_day};
pub use intent::{Classification, Intent, classify};

/// A short task produced by one of the planners.
fn micro_task(id: String, title: &str, kind: &str, minutes: u32, location: Option<&str>, energy: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        subject: None,
        kind: kind.to_string(),
        deadline: None,
        location: location.map(str::to_string),
        duration_estimate_min: Some(minutes),
        energy_level: Some(energy.to_string()),
        dependencies: None,
        status: TaskStatus::Pending,
    }
}

/// Minutes in `hours`, truncated. Negative and NaN become zero.
fn minutes_of(hours: f64) -> u32 {
    if hours.is_nan() || hours <= 0.0 {
        0
    } else {
        (hours * 60.0).min(f64::from(u32::MAX)) as u32
    }
}

/// Parse a local date or datetime: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]`
/// (a space also separates), or RFC 3339 with an offset, which is dropped.
/// A bare date means midnight.
pub fn parse_local_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_datetime_forms() {
        let noon = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(parse_local_datetime("2026-03-02T12:00"), Some(noon));
        assert_eq!(parse_local_datetime("2026-03-02 12:00:00"), Some(noon));
        assert_eq!(parse_local_datetime("2026-03-02T12:00:00+05:30"), Some(noon));
        assert_eq!(
            parse_local_datetime("2026-03-02"),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_local_datetime("next friday"), None);
    }

    #[test]
    fn hours_to_minutes() {
        assert_eq!(minutes_of(1.5), 90);
        assert_eq!(minutes_of(-2.0), 0);
        assert_eq!(minutes_of(f64::NAN), 0);
    }
}
