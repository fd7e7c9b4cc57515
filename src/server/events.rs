use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::NewEvent;
use crate::error::AppError;
use crate::models::CalendarEvent;
use crate::planner::slots::{self, FreeSlot};

/// Longest look-ahead for `/api/events/upcoming`.
const MAX_UPCOMING_DAYS: u32 = 366;

#[derive(Deserialize)]
pub(super) struct DayQuery {
    date: Option<NaiveDate>,
    category: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct UpcomingQuery {
    #[serde(default = "default_days")]
    days: u32,
}

fn default_days() -> u32 {
    7
}

#[derive(Deserialize)]
pub(super) struct SlotQuery {
    date: Option<NaiveDate>,
    #[serde(default = "default_duration")]
    duration_minutes: i64,
}

fn default_duration() -> i64 {
    60
}

#[derive(Serialize)]
pub(super) struct FreeSlots {
    date: NaiveDate,
    duration_minutes: i64,
    slots: Vec<FreeSlot>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// POST /api/events
pub(super) async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewEvent>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    let event = state.db.run(move |db| db.add_event(req)).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events
pub(super) async fn on_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let date = query.date.unwrap_or_else(today);
    let events = state
        .db
        .run(move |db| db.events_on(date, query.category.as_deref()))
        .await?;
    Ok(Json(events))
}

/// GET /api/events/upcoming
pub(super) async fn upcoming(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    if query.days > MAX_UPCOMING_DAYS {
        return Err(AppError::Validation(format!("days must be at most {MAX_UPCOMING_DAYS}")));
    }
    let now = Local::now().naive_local();
    Ok(Json(state.db.run(move |db| db.upcoming_events(now, query.days)).await?))
}

/// GET /api/events/free-slots
pub(super) async fn free_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<FreeSlots>, AppError> {
    if query.duration_minutes <= 0 {
        return Err(AppError::Validation("duration_minutes must be positive".into()));
    }
    let date = query.date.unwrap_or_else(today);
    let busy = state.db.run(move |db| db.busy_intervals(date)).await?;
    Ok(Json(FreeSlots {
        date,
        duration_minutes: query.duration_minutes,
        slots: slots::free_slots(date, &busy, query.duration_minutes),
    }))
}

/// DELETE /api/events/{id}
pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<CalendarEvent>, AppError> {
    Ok(Json(state.db.run(move |db| db.delete_event(id)).await?))
}
