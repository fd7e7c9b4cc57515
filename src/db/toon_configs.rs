use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;
use tracing::info;

use super::agents::find_agent;
use super::{Database, db_err, json_column, now_iso8601};
use crate::error::AppError;
use crate::models::ToonConfig;

const TOON_SELECT: &str = "
    SELECT t.id, t.agent_id, a.name, t.enabled, t.config, t.config_id, t.created_at, t.updated_at
    FROM toon_configs t JOIN agents a ON a.id = t.agent_id";

fn toon_from_row(row: &Row<'_>) -> rusqlite::Result<ToonConfig> {
    Ok(ToonConfig {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        agent_name: row.get(2)?,
        enabled: row.get(3)?,
        config: json_column(row, 4)?,
        config_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn find_for_agent(conn: &Connection, agent_id: i64) -> Result<Option<ToonConfig>, AppError> {
    conn.query_row(&format!("{TOON_SELECT} WHERE t.agent_id = ?1"), params![agent_id], toon_from_row)
        .optional()
        .map_err(db_err("lookup toon config"))
}

impl Database {
    /// One config per agent; a second create is a `Conflict`.
    pub fn create_toon_config(
        &self,
        agent_name: &str,
        enabled: bool,
        config: Value,
        config_id: Option<String>,
    ) -> Result<ToonConfig, AppError> {
        let agent_name = agent_name.trim();
        if agent_name.is_empty() {
            return Err(AppError::Validation("agent_name must not be empty".into()));
        }
        let config_json = serde_json::to_string(&config)
            .map_err(|e| AppError::Database(format!("serialize toon config: {e}")))?;

        let mut conn = self.open_conn()?;
        let tx = conn.transaction().map_err(db_err("begin create_toon_config"))?;
        let agent = find_agent(&tx, agent_name)?;
        if find_for_agent(&tx, agent.id)?.is_some() {
            return Err(AppError::Conflict(format!("toon config for '{}' already exists", agent.name)));
        }

        tx.execute(
            "INSERT INTO toon_configs (agent_id, enabled, config, config_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![agent.id, enabled, config_json, config_id, now_iso8601()],
        )
        .map_err(db_err("insert toon config"))?;
        let created = find_for_agent(&tx, agent.id)?
            .ok_or_else(|| AppError::Database("toon config vanished after insert".into()))?;
        tx.commit().map_err(db_err("commit create_toon_config"))?;

        info!(agent = %agent.name, enabled, "toon config created");
        Ok(created)
    }

    pub fn toon_config(&self, agent_name: &str) -> Result<ToonConfig, AppError> {
        let conn = self.open_conn()?;
        let agent = find_agent(&conn, agent_name.trim())?;
        find_for_agent(&conn, agent.id)?
            .ok_or_else(|| AppError::NotFound(format!("toon config for '{}'", agent.name)))
    }

    /// Set the enabled flag. Setting it to its current value is a no-op.
    pub fn set_toon_enabled(&self, agent_name: &str, enabled: bool) -> Result<ToonConfig, AppError> {
        let conn = self.open_conn()?;
        let agent = find_agent(&conn, agent_name.trim())?;
        let updated = conn
            .execute(
                "UPDATE toon_configs SET enabled = ?2, updated_at = ?3 WHERE agent_id = ?1 AND enabled != ?2",
                params![agent.id, enabled, now_iso8601()],
            )
            .map_err(db_err("toggle toon config"))?;
        let cfg = find_for_agent(&conn, agent.id)?
            .ok_or_else(|| AppError::NotFound(format!("toon config for '{}'", agent.name)))?;
        if updated > 0 {
            info!(agent = %agent.name, enabled, "toon config toggled");
        }
        Ok(cfg)
    }
}
