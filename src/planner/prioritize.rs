//! Deadline ranking, time estimates and break schedules.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::parse_local_datetime;
use crate::error::AppError;
use crate::models::Priority;

/// Urgency used when an item has no deadline or one that does not parse.
const DEFAULT_URGENCY: i64 = 5;
/// A deadline this many days out or further adds no urgency.
const URGENCY_HORIZON_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineItem {
    pub name: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub importance: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Critical,
    Elevated,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub rank: usize,
    pub name: String,
    pub deadline: Option<String>,
    pub importance: Priority,
    pub urgency_score: i64,
    pub priority_score: i64,
    pub band: Band,
}

/// Whole days from `now` until `deadline`, rounded towards the past.
fn days_until(deadline: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (deadline - now).num_seconds().div_euclid(86_400)
}

pub fn urgency(deadline: Option<&str>, now: NaiveDateTime) -> i64 {
    deadline
        .and_then(parse_local_datetime)
        .map_or(DEFAULT_URGENCY, |d| (URGENCY_HORIZON_DAYS - days_until(d, now)).max(0))
}

/// Rank by `urgency + 2 * importance weight`, highest first. Ties keep
/// input order.
pub fn rank_by_deadline(items: Vec<DeadlineItem>, now: NaiveDateTime) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = items
        .into_iter()
        .map(|item| {
            let urgency_score = urgency(item.deadline.as_deref(), now);
            let priority_score = urgency_score + item.importance.weight() * 2;
            RankedItem {
                rank: 0,
                name: item.name,
                deadline: item.deadline,
                importance: item.importance,
                urgency_score,
                priority_score,
                band: band(priority_score),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    for (i, item) in ranked.iter_mut().enumerate() {
        item.rank = i + 1;
    }
    ranked
}

fn band(score: i64) -> Band {
    match score {
        s if s >= 10 => Band::Critical,
        s if s >= 7 => Band::Elevated,
        _ => Band::Normal,
    }
}

// ── time needed ───────────────────────────────────────────────────────────────

/// Task length assumed when none is given.
const DEFAULT_TASK_MIN: u32 = 30;
/// Gap between consecutive tasks.
const BETWEEN_TASKS_MIN: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEstimate {
    pub task_count: usize,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub total_minutes: u32,
    pub hours: u32,
    pub minutes: u32,
}

pub fn time_needed(items: &[TimedItem], include_breaks: bool) -> TimeEstimate {
    let work_minutes: u32 = items
        .iter()
        .map(|t| t.duration_minutes.unwrap_or(DEFAULT_TASK_MIN))
        .fold(0, u32::saturating_add);
    let break_minutes = if include_breaks {
        (items.len().saturating_sub(1) as u32).saturating_mul(BETWEEN_TASKS_MIN)
    } else {
        0
    };
    let total_minutes = work_minutes.saturating_add(break_minutes);
    TimeEstimate {
        task_count: items.len(),
        work_minutes,
        break_minutes,
        total_minutes,
        hours: total_minutes / 60,
        minutes: total_minutes % 60,
    }
}

// ── breaks ────────────────────────────────────────────────────────────────────

/// Work stretch between short breaks.
const FOCUS_MIN: u32 = 50;
const SHORT_BREAK_MIN: u32 = 10;
const LONG_BREAK_MIN: u32 = 30;
/// Sessions up to this long get short breaks only.
const SHORT_SESSION_HOURS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakPlan {
    pub work_hours: u32,
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub short_breaks: u32,
    pub long_break_minutes: u32,
    pub long_breaks: u32,
}

/// Two short breaks per hour of work, plus a long break every four hours
/// once the session runs past two.
pub fn break_plan(work_hours: u32) -> Result<BreakPlan, AppError> {
    if work_hours == 0 {
        return Err(AppError::Validation("work duration must be positive".into()));
    }
    let long_breaks = if work_hours <= SHORT_SESSION_HOURS { 0 } else { work_hours / 4 };
    Ok(BreakPlan {
        work_hours,
        focus_minutes: FOCUS_MIN,
        short_break_minutes: SHORT_BREAK_MIN,
        short_breaks: work_hours.saturating_mul(2),
        long_break_minutes: LONG_BREAK_MIN,
        long_breaks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn item(name: &str, deadline: Option<&str>, importance: Priority) -> DeadlineItem {
        DeadlineItem { name: name.into(), deadline: deadline.map(Into::into), importance }
    }

    #[test]
    fn urgency_scores() {
        assert_eq!(urgency(None, now()), 5);
        assert_eq!(urgency(Some("soon"), now()), 5);
        assert_eq!(urgency(Some("2026-03-03T09:00"), now()), 8);
        // Midnight tomorrow is less than a day away.
        assert_eq!(urgency(Some("2026-03-02"), now()), 10);
        assert_eq!(urgency(Some("2026-04-01"), now()), 0);
        // Overdue items keep climbing.
        assert_eq!(urgency(Some("2026-02-27T09:00"), now()), 12);
    }

    #[test]
    fn ranking_combines_urgency_and_importance() {
        let ranked = rank_by_deadline(
            vec![
                item("essay", None, Priority::Low),
                item("lab record", Some("2026-03-02"), Priority::High),
                item("reading", Some("2026-03-20"), Priority::Medium),
                item("quiz", None, Priority::Urgent),
            ],
            now(),
        );
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["lab record", "quiz", "essay", "reading"]);
        assert_eq!(ranked[0].priority_score, 16);
        assert_eq!(ranked[0].band, Band::Critical);
        assert_eq!(ranked[2].priority_score, 7);
        assert_eq!(ranked[2].band, Band::Elevated);
        assert_eq!(ranked[3].band, Band::Normal);
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2, 3, 4]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank_by_deadline(
            vec![item("a", None, Priority::Medium), item("b", None, Priority::Medium)],
            now(),
        );
        assert_eq!(ranked[0].name, "a");
    }

    #[test]
    fn time_needed_adds_gaps() {
        let items = vec![
            TimedItem { name: Some("read".into()), duration_minutes: Some(45) },
            TimedItem { name: None, duration_minutes: None },
            TimedItem { name: None, duration_minutes: Some(20) },
        ];
        let est = time_needed(&items, true);
        assert_eq!(est.work_minutes, 95);
        assert_eq!(est.break_minutes, 20);
        assert_eq!((est.hours, est.minutes), (1, 55));
        assert_eq!(time_needed(&items, false).total_minutes, 95);
        assert_eq!(time_needed(&[], true).total_minutes, 0);
    }

    #[test]
    fn break_plans() {
        let short = break_plan(2).unwrap();
        assert_eq!((short.short_breaks, short.long_breaks), (4, 0));
        let long = break_plan(9).unwrap();
        assert_eq!((long.short_breaks, long.long_breaks), (18, 2));
        assert!(matches!(break_plan(0), Err(AppError::Validation(_))));
    }
}
