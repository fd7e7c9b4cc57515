use axum::{Json, extract::State};

use super::AppState;
use crate::error::AppError;
use crate::models::AgentSummary;

/// GET /api/agents
pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<AgentSummary>>, AppError> {
    let summaries = state.db.run(|db| db.agent_summaries()).await?;
    Ok(Json(summaries))
}
