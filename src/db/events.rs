use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

use super::{Database, db_err, now_iso8601};
use crate::error::AppError;
use crate::models::CalendarEvent;
use crate::planner::parse_local_datetime;

const EVENT_COLUMNS: &str =
    "id, title, start_time, end_time, category, description, location, created_at";

/// Stored event times sort lexically in this form.
const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

fn default_category() -> String { "general".to_string() }

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn stored(t: NaiveDateTime) -> String {
    t.format(STORED_FORMAT).to_string()
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveDateTime, AppError> {
    parse_local_datetime(raw.trim()).ok_or_else(|| {
        AppError::Validation(format!("{field} '{raw}' is not a local datetime (YYYY-MM-DDTHH:MM)"))
    })
}

fn find_event(conn: &Connection, id: i64) -> Result<CalendarEvent, AppError> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
        params![id],
        event_from_row,
    )
    .optional()
    .map_err(db_err("lookup event"))?
    .ok_or_else(|| AppError::NotFound(format!("event {id}")))
}

impl Database {
    pub fn add_event(&self, new: NewEvent) -> Result<CalendarEvent, AppError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        let start = parse_time("start_time", &new.start_time)?;
        let end = parse_time("end_time", &new.end_time)?;
        if end <= start {
            return Err(AppError::Validation("end_time must be after start_time".into()));
        }
        let category = match new.category.trim() {
            "" => default_category(),
            c => c.to_lowercase(),
        };

        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO events (title, start_time, end_time, category, description, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                title,
                stored(start),
                stored(end),
                category,
                new.description.trim(),
                new.location.trim(),
                now_iso8601()
            ],
        )
        .map_err(db_err("insert event"))?;
        let event = find_event(&conn, conn.last_insert_rowid())?;
        info!(id = event.id, start = %event.start_time, "event added");
        Ok(event)
    }

    /// Events starting on `date`, earliest first.
    pub fn events_on(&self, date: NaiveDate, category: Option<&str>) -> Result<Vec<CalendarEvent>, AppError> {
        let from = stored(day_start(date));
        let to = stored(day_start(date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)));
        let category = category.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty());
        self.select_events(
            "WHERE start_time >= ?1 AND start_time < ?2 AND (?3 IS NULL OR category = ?3)
             ORDER BY start_time, id",
            params![from, to, category],
        )
    }

    /// Events starting between `now` and `days` days later, inclusive.
    pub fn upcoming_events(&self, now: NaiveDateTime, days: u32) -> Result<Vec<CalendarEvent>, AppError> {
        let until = now
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDateTime::MAX);
        self.select_events(
            "WHERE start_time >= ?1 AND start_time <= ?2 ORDER BY start_time, id",
            params![stored(now), stored(until)],
        )
    }

    /// `(start, end)` of every event starting on `date`.
    pub fn busy_intervals(&self, date: NaiveDate) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, AppError> {
        self.events_on(date, None)?
            .into_iter()
            .map(|e| Ok((parse_time("start_time", &e.start_time)?, parse_time("end_time", &e.end_time)?)))
            .collect()
    }

    /// Delete and return the removed row.
    pub fn delete_event(&self, id: i64) -> Result<CalendarEvent, AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn.transaction().map_err(db_err("begin delete_event"))?;
        let event = find_event(&tx, id)?;
        tx.execute("DELETE FROM events WHERE id = ?1", params![id])
            .map_err(db_err("delete event"))?;
        tx.commit().map_err(db_err("commit delete_event"))?;
        info!(id, "event deleted");
        Ok(event)
    }

    fn select_events(&self, clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<CalendarEvent>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events {clause}"))
            .map_err(db_err("prepare select events"))?;
        let rows = stmt
            .query_map(params, event_from_row)
            .map_err(db_err("query events"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db_err("read event row"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn new_event(title: &str, start: &str, end: &str, category: &str) -> NewEvent {
        NewEvent {
            title: title.into(),
            start_time: start.into(),
            end_time: end.into(),
            category: category.into(),
            description: String::new(),
            location: String::new(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn times_are_normalized() {
        let (_temp, db) = test_db();
        let e = db.add_event(new_event("DBMS lecture", "2026-03-02 09:00", "2026-03-02T10:30", "Class")).unwrap();
        assert_eq!(e.start_time, "2026-03-02T09:00:00");
        assert_eq!(e.end_time, "2026-03-02T10:30:00");
        assert_eq!(e.category, "class");
    }

    #[test]
    fn rejects_bad_times() {
        let (_temp, db) = test_db();
        for (start, end) in [
            ("tomorrow", "2026-03-02T10:00"),
            ("2026-03-02T10:00", "2026-03-02T10:00"),
            ("2026-03-02T11:00", "2026-03-02T10:00"),
        ] {
            assert!(
                matches!(db.add_event(new_event("x", start, end, "study")), Err(AppError::Validation(_))),
                "{start} -> {end}"
            );
        }
        assert!(matches!(
            db.add_event(new_event(" ", "2026-03-02T09:00", "2026-03-02T10:00", "study")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn day_listing_and_category_filter() {
        let (_temp, db) = test_db();
        db.add_event(new_event("late", "2026-03-02T18:00", "2026-03-02T19:00", "study")).unwrap();
        db.add_event(new_event("early", "2026-03-02T08:00", "2026-03-02T09:00", "class")).unwrap();
        db.add_event(new_event("next day", "2026-03-03T00:00", "2026-03-03T01:00", "study")).unwrap();

        let titles = |events: Vec<CalendarEvent>| events.into_iter().map(|e| e.title).collect::<Vec<_>>();
        assert_eq!(titles(db.events_on(date(2), None).unwrap()), ["early", "late"]);
        assert_eq!(titles(db.events_on(date(2), Some("Study")).unwrap()), ["late"]);
        assert!(db.events_on(date(1), None).unwrap().is_empty());
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let (_temp, db) = test_db();
        db.add_event(new_event("past", "2026-03-01T08:00", "2026-03-01T09:00", "study")).unwrap();
        db.add_event(new_event("edge", "2026-03-08T09:00", "2026-03-08T10:00", "study")).unwrap();
        db.add_event(new_event("beyond", "2026-03-08T09:01", "2026-03-08T10:00", "study")).unwrap();
        let now = date(1).and_hms_opt(9, 0, 0).unwrap();
        let upcoming = db.upcoming_events(now, 7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "edge");
    }

    #[test]
    fn busy_intervals_feed_free_slots() {
        let (_temp, db) = test_db();
        db.add_event(new_event("a", "2026-03-02T09:00", "2026-03-02T12:00", "class")).unwrap();
        let busy = db.busy_intervals(date(2)).unwrap();
        assert_eq!(busy, [(date(2).and_hms_opt(9, 0, 0).unwrap(), date(2).and_hms_opt(12, 0, 0).unwrap())]);
        let slots = crate::planner::slots::free_slots(date(2), &busy, 60);
        assert_eq!(slots[0].end, "09:00");
        assert_eq!(slots[1].start, "12:00");
    }

    #[test]
    fn delete_returns_row() {
        let (_temp, db) = test_db();
        let e = db.add_event(new_event("a", "2026-03-02T09:00", "2026-03-02T10:00", "class")).unwrap();
        assert_eq!(db.delete_event(e.id).unwrap(), e);
        assert!(matches!(db.delete_event(e.id), Err(AppError::NotFound(_))));
    }
}
