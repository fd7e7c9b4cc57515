use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;
use tracing::info;

use super::agents::find_agent;
use super::{Database, db_err, json_column, now_iso8601, text_column};
use crate::error::AppError;
use crate::models::{Optimizer, OptimizerType};

const OPTIMIZER_SELECT: &str = "
    SELECT o.id, o.agent_id, a.name, o.optimizer_type, o.name, o.is_active, o.config,
           o.created_at, o.updated_at
    FROM optimizers o JOIN agents a ON a.id = o.agent_id";

fn optimizer_from_row(row: &Row<'_>) -> rusqlite::Result<Optimizer> {
    Ok(Optimizer {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        agent_name: row.get(2)?,
        optimizer_type: text_column(row, 3)?,
        name: row.get(4)?,
        is_active: row.get(5)?,
        config: json_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn find_optimizer(conn: &Connection, id: i64) -> Result<Optimizer, AppError> {
    conn.query_row(&format!("{OPTIMIZER_SELECT} WHERE o.id = ?1"), params![id], optimizer_from_row)
        .optional()
        .map_err(db_err("lookup optimizer"))?
        .ok_or_else(|| AppError::NotFound(format!("optimizer {id}")))
}

impl Database {
    /// Attach a new, active optimizer to the named agent.
    ///
    /// A blank `name` falls back to `"{agent} {type} optimizer"`.
    pub fn create_optimizer(
        &self,
        agent_name: &str,
        optimizer_type: OptimizerType,
        name: Option<String>,
        config: Value,
    ) -> Result<Optimizer, AppError> {
        let agent_name = agent_name.trim();
        if agent_name.is_empty() {
            return Err(AppError::Validation("agent_name must not be empty".into()));
        }

        let mut conn = self.open_conn()?;
        let tx = conn.transaction().map_err(db_err("begin create_optimizer"))?;
        let agent = find_agent(&tx, agent_name)?;

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} {} optimizer", agent.name, optimizer_type));
        let config_json = serde_json::to_string(&config)
            .map_err(|e| AppError::Database(format!("serialize optimizer config: {e}")))?;
        let now = now_iso8601();

        tx.execute(
            "INSERT INTO optimizers (agent_id, optimizer_type, name, is_active, config, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?5)",
            params![agent.id, optimizer_type.as_str(), name, config_json, now],
        )
        .map_err(db_err("insert optimizer"))?;
        let id = tx.last_insert_rowid();
        let optimizer = find_optimizer(&tx, id)?;
        tx.commit().map_err(db_err("commit create_optimizer"))?;

        info!(id, agent = %agent.name, kind = %optimizer_type, "optimizer created");
        Ok(optimizer)
    }

    pub fn optimizer(&self, id: i64) -> Result<Optimizer, AppError> {
        let conn = self.open_conn()?;
        find_optimizer(&conn, id)
    }

    /// Every optimizer of the named agent, active or not, oldest first.
    pub fn optimizers_for_agent(&self, agent_name: &str) -> Result<Vec<Optimizer>, AppError> {
        let conn = self.open_conn()?;
        let agent = find_agent(&conn, agent_name.trim())?;
        select_for_agent(&conn, agent.id)
    }

    pub(super) fn optimizers_for_agent_id(&self, agent_id: i64) -> Result<Vec<Optimizer>, AppError> {
        let conn = self.open_conn()?;
        select_for_agent(&conn, agent_id)
    }

    /// Soft delete. Deactivating an inactive optimizer succeeds unchanged.
    pub fn deactivate_optimizer(&self, id: i64) -> Result<Optimizer, AppError> {
        let conn = self.open_conn()?;
        let updated = conn
            .execute(
                "UPDATE optimizers SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
                params![id, now_iso8601()],
            )
            .map_err(db_err("deactivate optimizer"))?;
        let optimizer = find_optimizer(&conn, id)?;
        if updated > 0 {
            info!(id, "optimizer deactivated");
        }
        Ok(optimizer)
    }
}

fn select_for_agent(conn: &Connection, agent_id: i64) -> Result<Vec<Optimizer>, AppError> {
    let mut stmt = conn
        .prepare(&format!("{OPTIMIZER_SELECT} WHERE o.agent_id = ?1 ORDER BY o.id"))
        .map_err(db_err("prepare optimizers_for_agent"))?;
    let rows = stmt
        .query_map(params![agent_id], optimizer_from_row)
        .map_err(db_err("query optimizers_for_agent"))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(db_err("read optimizer row"))
}
