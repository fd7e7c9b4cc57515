use axum::{Json, extract::Path};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::planner::crisis::{self, CatchupPlan, CatchupRequest};
use crate::planner::day::{self, DayPlan, DayRequest};
use crate::planner::prioritize::{self, BreakPlan, DeadlineItem, RankedItem, TimeEstimate, TimedItem};
use crate::planner::review::{self, Algorithm, ReviewSession};
use crate::planner::{Classification, classify};
use crate::toon;

const MAX_REVIEW_SESSIONS: u32 = 30;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct MessageRequest {
    message: String,
    location: Option<String>,
    available_hours: Option<f64>,
}

/// A plan plus its Toon rendering for the agent transcript.
#[derive(Serialize)]
pub(super) struct PlanResponse<P> {
    #[serde(flatten)]
    plan: P,
    toon: String,
}

#[derive(Deserialize)]
pub(super) struct PrioritizeRequest {
    tasks: Vec<DeadlineItem>,
}

#[derive(Deserialize)]
pub(super) struct TimeNeededRequest {
    tasks: Vec<TimedItem>,
    #[serde(default = "default_include_breaks")]
    include_breaks: bool,
}

fn default_include_breaks() -> bool {
    true
}

#[derive(Deserialize)]
pub(super) struct ReviewRequest {
    topic: String,
    total_sessions: Option<u32>,
    algorithm: Option<String>,
    start_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub(super) struct ReviewResponse {
    topic: String,
    algorithm: Algorithm,
    sessions: Vec<ReviewSession>,
}

#[derive(Deserialize)]
pub(super) struct IntentRequest {
    message: String,
}

fn toon_of(value: &impl Serialize) -> Result<String, AppError> {
    let value = serde_json::to_value(value).map_err(|e| AppError::Server(format!("serialize plan: {e}")))?;
    Ok(toon::encode(&value))
}

fn catchup_response(req: &CatchupRequest) -> Result<Json<PlanResponse<CatchupPlan>>, AppError> {
    let plan = crisis::plan_catchup(req, "crisis");
    debug!(severity = ?plan.episode.severity, tasks = plan.block.tasks.len(), "catch-up planned");
    let toon = toon_of(&plan.block)?;
    Ok(Json(PlanResponse { plan, toon }))
}

fn day_response(req: &DayRequest) -> Result<Json<PlanResponse<DayPlan>>, AppError> {
    let plan = day::plan_day(req);
    debug!(total_min = plan.total_min, blocks = plan.blocks.len(), "day planned");
    let toon = toon_of(&json!({ "blocks": plan.blocks }))?;
    Ok(Json(PlanResponse { plan, toon }))
}

fn require_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".into()));
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/planner/crisis
pub(super) async fn crisis_plan(Json(req): Json<CatchupRequest>) -> Result<Json<PlanResponse<CatchupPlan>>, AppError> {
    catchup_response(&req)
}

/// POST /api/planner/crisis/message
pub(super) async fn crisis_from_message(
    Json(req): Json<MessageRequest>,
) -> Result<Json<PlanResponse<CatchupPlan>>, AppError> {
    require_message(&req.message)?;
    let mut inferred = crisis::infer_catchup(&req.message);
    inferred.location = req.location;
    if let Some(hours) = req.available_hours {
        inferred.available_hours = hours;
    }
    catchup_response(&inferred)
}

/// POST /api/planner/day
pub(super) async fn day_plan(Json(req): Json<DayRequest>) -> Result<Json<PlanResponse<DayPlan>>, AppError> {
    day_response(&req)
}

/// POST /api/planner/day/message
pub(super) async fn day_from_message(
    Json(req): Json<MessageRequest>,
) -> Result<Json<PlanResponse<DayPlan>>, AppError> {
    require_message(&req.message)?;
    let mut inferred = day::infer_day(&req.message, req.location.as_deref());
    if let Some(hours) = req.available_hours {
        inferred.available_hours = hours;
    }
    day_response(&inferred)
}

/// POST /api/planner/prioritize
pub(super) async fn rank(Json(req): Json<PrioritizeRequest>) -> Json<Vec<RankedItem>> {
    Json(prioritize::rank_by_deadline(req.tasks, Local::now().naive_local()))
}

/// POST /api/planner/time-needed
pub(super) async fn time_needed(Json(req): Json<TimeNeededRequest>) -> Json<TimeEstimate> {
    Json(prioritize::time_needed(&req.tasks, req.include_breaks))
}

/// GET /api/planner/breaks/{hours}
pub(super) async fn breaks(Path(hours): Path<u32>) -> Result<Json<BreakPlan>, AppError> {
    Ok(Json(prioritize::break_plan(hours)?))
}

/// POST /api/planner/review-schedule
pub(super) async fn review_schedule(Json(req): Json<ReviewRequest>) -> Result<Json<ReviewResponse>, AppError> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic must not be empty".into()));
    }
    let sessions = req.total_sessions.unwrap_or(7);
    if !(1..=MAX_REVIEW_SESSIONS).contains(&sessions) {
        return Err(AppError::Validation(format!(
            "total_sessions must be between 1 and {MAX_REVIEW_SESSIONS}"
        )));
    }
    let algorithm: Algorithm = req.algorithm.as_deref().map(str::parse).transpose()?.unwrap_or_default();
    let start = req.start_date.unwrap_or_else(|| Local::now().date_naive());

    Ok(Json(ReviewResponse {
        topic: topic.to_string(),
        algorithm,
        sessions: review::review_schedule(topic, sessions, algorithm, start),
    }))
}

/// POST /api/intent
pub(super) async fn intent(Json(req): Json<IntentRequest>) -> Result<Json<Classification>, AppError> {
    require_message(&req.message)?;
    Ok(Json(classify(&req.message)))
}
