//! HTTP surface: an axum router over the store, the Toon codec, the
//! context helper and the planners.
//!
//! ## URL layout
//!
//! ```text
//! GET    /health
//! GET    /api/agents
//! POST   /api/optimizers
//! GET    /api/optimizers/{id}
//! DELETE /api/optimizers/{id}
//! GET    /api/optimizers/agent/{agent_name}
//! POST   /api/toon/config
//! GET    /api/toon/config/{agent_name}
//! PATCH  /api/toon/config/{agent_name}/toggle
//! POST   /api/toon/encode
//! POST   /api/toon/decode
//! POST   /api/tools/register/{tool_key}
//! POST   /api/tools/register-all
//! GET    /api/tools
//! GET    /api/tools/available
//! GET    /api/tools/category/{category}
//! GET    /api/tools/recommended/{context}
//! PATCH  /api/tools/{tool_id}/toggle
//! POST   /api/context/stats
//! POST   /api/context/optimize
//! POST   /api/intent
//! POST   /api/planner/crisis
//! POST   /api/planner/crisis/message
//! POST   /api/planner/day
//! POST   /api/planner/day/message
//! POST   /api/planner/prioritize
//! POST   /api/planner/time-needed
//! GET    /api/planner/breaks/{hours}
//! POST   /api/planner/review-schedule
//! POST   /api/tasks
//! GET    /api/tasks?status=&category=&priority=
//! GET    /api/tasks/urgent
//! PATCH  /api/tasks/{id}/complete
//! PATCH  /api/tasks/{id}/priority
//! DELETE /api/tasks/{id}
//! POST   /api/events
//! GET    /api/events?date=&category=
//! GET    /api/events/upcoming?days=
//! GET    /api/events/free-slots?date=&duration_minutes=
//! DELETE /api/events/{id}
//! ```

mod agents;
mod context;
mod events;
mod health;
mod optimizers;
mod planner;
mod tasks;
mod toon;
mod tools;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self { db, config: Arc::new(config) }
    }
}

// ── Error responses ───────────────────────────────────────────────────────────

fn json_error(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": code, "message": format!("{msg}") }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Codec(e) => json_error(StatusCode::BAD_REQUEST, "invalid_payload", e),
            AppError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            other => {
                error!("request failed: {other}");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal server error")
            }
        }
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `config.server.bind` and serve until `shutdown` is cancelled.
pub async fn serve(state: AppState, shutdown: CancellationToken) -> Result<(), AppError> {
    let bind_addr = state.config.server.bind.clone();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    // The web client is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health",                               get(health::health))
        .route("/api/agents",                           get(agents::list))
        .route("/api/optimizers",                       post(optimizers::create))
        .route("/api/optimizers/{id}",                  get(optimizers::get_one).delete(optimizers::deactivate))
        .route("/api/optimizers/agent/{agent_name}",    get(optimizers::for_agent))
        .route("/api/toon/config",                      post(toon::create_config))
        .route("/api/toon/config/{agent_name}",         get(toon::get_config))
        .route("/api/toon/config/{agent_name}/toggle",  patch(toon::toggle_config))
        .route("/api/toon/encode",                      post(toon::encode))
        .route("/api/toon/decode",                      post(toon::decode))
        .route("/api/tools",                            get(tools::active))
        .route("/api/tools/available",                  get(tools::available))
        .route("/api/tools/register-all",               post(tools::register_all))
        .route("/api/tools/register/{tool_key}",        post(tools::register))
        .route("/api/tools/category/{category}",        get(tools::by_category))
        .route("/api/tools/recommended/{context}",      get(tools::recommended))
        .route("/api/tools/{tool_id}/toggle",           patch(tools::toggle))
        .route("/api/context/stats",                    post(context::stats))
        .route("/api/context/optimize",                 post(context::optimize))
        .route("/api/intent",                           post(planner::intent))
        .route("/api/planner/crisis",                   post(planner::crisis_plan))
        .route("/api/planner/crisis/message",           post(planner::crisis_from_message))
        .route("/api/planner/day",                      post(planner::day_plan))
        .route("/api/planner/day/message",              post(planner::day_from_message))
        .route("/api/planner/prioritize",               post(planner::rank))
        .route("/api/planner/time-needed",              post(planner::time_needed))
        .route("/api/planner/breaks/{hours}",           get(planner::breaks))
        .route("/api/planner/review-schedule",          post(planner::review_schedule))
        .route("/api/tasks",                            post(tasks::create).get(tasks::list))
        .route("/api/tasks/urgent",                     get(tasks::urgent))
        .route("/api/tasks/{id}",                       delete(tasks::delete))
        .route("/api/tasks/{id}/complete",              patch(tasks::complete))
        .route("/api/tasks/{id}/priority",              patch(tasks::set_priority))
        .route("/api/events",                           post(events::create).get(events::on_day))
        .route("/api/events/upcoming",                  get(events::upcoming))
        .route("/api/events/free-slots",                get(events::free_slots))
        .route("/api/events/{id}",                      delete(events::delete))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toon::ToonError;
    use axum::body::to_bytes;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let resp = AppError::Validation("agent_name must not be empty".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "agent_name must not be empty");
    }

    #[tokio::test]
    async fn codec_maps_to_400_invalid_payload() {
        let resp = AppError::from(ToonError::UnknownMessageType("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "invalid_payload");
    }

    #[tokio::test]
    async fn not_found_and_conflict() {
        let resp = AppError::NotFound("optimizer 9".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = AppError::Conflict("exists".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["error"], "conflict");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let resp = AppError::Database("disk I/O error at /secret/path".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "internal");
        assert!(!body["message"].as_str().unwrap().contains("/secret/path"));
    }
}
