use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::AppError;
use crate::models::{Optimizer, OptimizerType};

#[derive(Deserialize)]
pub(super) struct CreateOptimizer {
    #[serde(default)]
    agent_name: String,
    #[serde(default)]
    optimizer_type: String,
    name: Option<String>,
    #[serde(default)]
    config: Option<Value>,
}

/// POST /api/optimizers
pub(super) async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOptimizer>,
) -> Result<(StatusCode, Json<Optimizer>), AppError> {
    if req.agent_name.trim().is_empty() {
        return Err(AppError::Validation("agent_name must not be empty".into()));
    }
    let kind: OptimizerType = req.optimizer_type.parse()?;
    let config = req.config.unwrap_or_else(|| Value::Object(Default::default()));

    let optimizer = state
        .db
        .run(move |db| db.create_optimizer(&req.agent_name, kind, req.name, config))
        .await?;
    Ok((StatusCode::CREATED, Json(optimizer)))
}

/// GET /api/optimizers/{id}
pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Optimizer>, AppError> {
    Ok(Json(state.db.run(move |db| db.optimizer(id)).await?))
}

/// GET /api/optimizers/agent/{agent_name}
pub(super) async fn for_agent(
    State(state): State<AppState>,
    Path(agent_name): Path<String>,
) -> Result<Json<Vec<Optimizer>>, AppError> {
    Ok(Json(state.db.run(move |db| db.optimizers_for_agent(&agent_name)).await?))
}

/// DELETE /api/optimizers/{id}. Soft delete; returns the deactivated row.
pub(super) async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Optimizer>, AppError> {
    Ok(Json(state.db.run(move |db| db.deactivate_optimizer(id)).await?))
}
