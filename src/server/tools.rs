use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::catalog::{self, BUILTIN_TOOLS, CatalogEntry};
use crate::error::AppError;
use crate::models::{AgentContext, Tool, ToolCategory};

#[derive(Deserialize)]
pub(super) struct Toggle {
    is_active: bool,
}

/// Catalog entry annotated with whether it has been registered.
#[derive(Serialize)]
pub(super) struct AvailableTool {
    #[serde(flatten)]
    entry: CatalogEntry,
    registered: bool,
}

#[derive(Serialize)]
pub(super) struct Recommended {
    context: AgentContext,
    tools: Vec<&'static CatalogEntry>,
}

/// POST /api/tools/register/{tool_key}
pub(super) async fn register(
    State(state): State<AppState>,
    Path(tool_key): Path<String>,
) -> Result<Json<Tool>, AppError> {
    Ok(Json(state.db.run(move |db| db.register_tool(&tool_key)).await?))
}

/// POST /api/tools/register-all
pub(super) async fn register_all(State(state): State<AppState>) -> Result<Json<Vec<Tool>>, AppError> {
    Ok(Json(state.db.run(|db| db.register_all_tools()).await?))
}

/// GET /api/tools
pub(super) async fn active(State(state): State<AppState>) -> Result<Json<Vec<Tool>>, AppError> {
    Ok(Json(state.db.run(|db| db.active_tools()).await?))
}

/// GET /api/tools/available
pub(super) async fn available(State(state): State<AppState>) -> Result<Json<Vec<AvailableTool>>, AppError> {
    let registered = state.db.run(|db| db.registered_tool_keys()).await?;
    let tools = BUILTIN_TOOLS
        .iter()
        .map(|entry| AvailableTool { entry: *entry, registered: registered.contains(entry.key) })
        .collect();
    Ok(Json(tools))
}

/// GET /api/tools/category/{category}
pub(super) async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Tool>>, AppError> {
    let category: ToolCategory = category.parse()?;
    Ok(Json(state.db.run(move |db| db.tools_by_category(category)).await?))
}

/// GET /api/tools/recommended/{context}
pub(super) async fn recommended(Path(context): Path<String>) -> Result<Json<Recommended>, AppError> {
    let context: AgentContext = context.parse()?;
    Ok(Json(Recommended { context, tools: catalog::recommended_entries(context) }))
}

/// PATCH /api/tools/{tool_id}/toggle
pub(super) async fn toggle(
    State(state): State<AppState>,
    Path(tool_id): Path<i64>,
    Json(req): Json<Toggle>,
) -> Result<Json<Tool>, AppError> {
    Ok(Json(
        state
            .db
            .run(move |db| db.set_tool_active(tool_id, req.is_active))
            .await?,
    ))
}
