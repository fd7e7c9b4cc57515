use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use serde::Deserialize;
use tracing::info;

use super::{Database, db_err, now_iso8601, text_column};
use crate::error::AppError;
use crate::models::{Priority, TaskRecord, TaskStatus};
use crate::planner::parse_local_datetime;

const TASK_COLUMNS: &str =
    "id, title, description, priority, category, deadline, status, created_at, completed_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    /// Date or local datetime.
    #[serde(default)]
    pub deadline: Option<String>,
}

fn default_category() -> String { "general".to_string() }

/// Every field narrows the listing; `None` matches anything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: text_column(row, 3)?,
        category: row.get(4)?,
        deadline: row.get(5)?,
        status: text_column(row, 6)?,
        created_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

fn find_task(conn: &Connection, id: i64) -> Result<TaskRecord, AppError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        task_from_row,
    )
    .optional()
    .map_err(db_err("lookup task"))?
    .ok_or_else(|| AppError::NotFound(format!("task {id}")))
}

impl Database {
    pub fn create_task(&self, new: NewTask) -> Result<TaskRecord, AppError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        let category = match new.category.trim() {
            "" => default_category(),
            c => c.to_lowercase(),
        };
        let deadline = new
            .deadline
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &deadline {
            if parse_local_datetime(d).is_none() {
                return Err(AppError::Validation(format!(
                    "deadline '{d}' is not a date (YYYY-MM-DD) or datetime"
                )));
            }
        }

        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO tasks (title, description, priority, category, deadline, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                title,
                new.description.trim(),
                new.priority.as_str(),
                category,
                deadline,
                TaskStatus::Pending.as_str(),
                now_iso8601()
            ],
        )
        .map_err(db_err("insert task"))?;
        let task = find_task(&conn, conn.last_insert_rowid())?;
        info!(id = task.id, priority = %task.priority, "task created");
        Ok(task)
    }

    pub fn task(&self, id: i64) -> Result<TaskRecord, AppError> {
        let conn = self.open_conn()?;
        find_task(&conn, id)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, AppError> {
        let mut clauses = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            values.push(Box::new(status.as_str()));
            clauses.push(format!("status = ?{}", values.len()));
        }
        if let Some(category) = &filter.category {
            values.push(Box::new(category.trim().to_lowercase()));
            clauses.push(format!("category = ?{}", values.len()));
        }
        if let Some(priority) = filter.priority {
            values.push(Box::new(priority.as_str()));
            clauses.push(format!("priority = ?{}", values.len()));
        }
        let clause = if clauses.is_empty() {
            "ORDER BY id".to_string()
        } else {
            format!("WHERE {} ORDER BY id", clauses.join(" AND "))
        };
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        self.select_tasks(&clause, &params)
    }

    /// Pending `high` and `urgent` tasks: urgent first, then by deadline
    /// (undated last).
    pub fn urgent_tasks(&self) -> Result<Vec<TaskRecord>, AppError> {
        self.select_tasks(
            "WHERE status = ?1 AND priority IN (?2, ?3)
             ORDER BY priority = ?3 DESC, deadline IS NULL, deadline, id",
            params![TaskStatus::Pending.as_str(), Priority::High.as_str(), Priority::Urgent.as_str()],
        )
    }

    /// Mark done. Completing a completed task keeps its first `completed_at`.
    pub fn complete_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        let conn = self.open_conn()?;
        let updated = conn
            .execute(
                "UPDATE tasks SET status = ?2, completed_at = ?3 WHERE id = ?1 AND status != ?2",
                params![id, TaskStatus::Completed.as_str(), now_iso8601()],
            )
            .map_err(db_err("complete task"))?;
        let task = find_task(&conn, id)?;
        if updated > 0 {
            info!(id, "task completed");
        }
        Ok(task)
    }

    pub fn set_task_priority(&self, id: i64, priority: Priority) -> Result<TaskRecord, AppError> {
        let conn = self.open_conn()?;
        let updated = conn
            .execute(
                "UPDATE tasks SET priority = ?2 WHERE id = ?1",
                params![id, priority.as_str()],
            )
            .map_err(db_err("update task priority"))?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("task {id}")));
        }
        find_task(&conn, id)
    }

    /// Delete and return the removed row.
    pub fn delete_task(&self, id: i64) -> Result<TaskRecord, AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn.transaction().map_err(db_err("begin delete_task"))?;
        let task = find_task(&tx, id)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(db_err("delete task"))?;
        tx.commit().map_err(db_err("commit delete_task"))?;
        info!(id, "task deleted");
        Ok(task)
    }

    fn select_tasks(&self, clause: &str, params: &[&dyn ToSql]) -> Result<Vec<TaskRecord>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks {clause}"))
            .map_err(db_err("prepare select tasks"))?;
        let rows = stmt
            .query_map(params, task_from_row)
            .map_err(db_err("query tasks"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db_err("read task row"))
    }
}
