use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::AppState;
use crate::db::{NewTask, TaskFilter};
use crate::error::AppError;
use crate::models::{Priority, TaskRecord};

#[derive(Deserialize)]
pub(super) struct ListQuery {
    status: Option<String>,
    category: Option<String>,
    priority: Option<String>,
}

impl ListQuery {
    /// Empty values and `status=all` leave that field unfiltered.
    fn into_filter(self) -> Result<TaskFilter, AppError> {
        let given = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let status = given(self.status).filter(|s| !s.eq_ignore_ascii_case("all"));
        Ok(TaskFilter {
            status: status.as_deref().map(str::parse).transpose()?,
            category: given(self.category),
            priority: given(self.priority).as_deref().map(str::parse).transpose()?,
        })
    }
}

#[derive(Deserialize)]
pub(super) struct SetPriority {
    priority: Priority,
}

/// POST /api/tasks
pub(super) async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<TaskRecord>), AppError> {
    let task = state.db.run(move |db| db.create_task(req)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TaskRecord>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(state.db.run(move |db| db.list_tasks(&filter)).await?))
}

/// GET /api/tasks/urgent
pub(super) async fn urgent(State(state): State<AppState>) -> Result<Json<Vec<TaskRecord>>, AppError> {
    Ok(Json(state.db.run(|db| db.urgent_tasks()).await?))
}

/// PATCH /api/tasks/{id}/complete
pub(super) async fn complete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<TaskRecord>, AppError> {
    Ok(Json(state.db.run(move |db| db.complete_task(id)).await?))
}

/// PATCH /api/tasks/{id}/priority
pub(super) async fn set_priority(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetPriority>,
) -> Result<Json<TaskRecord>, AppError> {
    Ok(Json(state.db.run(move |db| db.set_task_priority(id, req.priority)).await?))
}

/// DELETE /api/tasks/{id}
pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<TaskRecord>, AppError> {
    Ok(Json(state.db.run(move |db| db.delete_task(id)).await?))
}
