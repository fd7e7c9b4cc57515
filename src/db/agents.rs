use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{Database, db_err, text_column};
use crate::catalog;
use crate::error::AppError;
use crate::models::{Agent, AgentSummary, ToonStatus};

const AGENT_COLUMNS: &str = "id, name, description, context, created_at";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        context: text_column(row, 3)?,
        created_at: row.get(4)?,
    })
}

/// Resolve an agent by its display name on an open connection.
pub(super) fn find_agent(conn: &Connection, name: &str) -> Result<Agent, AppError> {
    conn.query_row(
        &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE name = ?1"),
        params![name],
        agent_from_row,
    )
    .optional()
    .map_err(db_err("lookup agent"))?
    .ok_or_else(|| AppError::NotFound(format!("agent '{name}'")))
}

impl Database {
    pub fn list_agents(&self) -> Result<Vec<Agent>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY id"))
            .map_err(db_err("prepare list_agents"))?;
        let rows = stmt
            .query_map([], agent_from_row)
            .map_err(db_err("query list_agents"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db_err("read agent row"))
    }

    pub fn agent_by_name(&self, name: &str) -> Result<Agent, AppError> {
        let conn = self.open_conn()?;
        find_agent(&conn, name)
    }

    /// Dashboard view: every agent with its optimizers, Toon state and the
    /// number of active tools recommended for its context.
    pub fn agent_summaries(&self) -> Result<Vec<AgentSummary>, AppError> {
        let agents = self.list_agents()?;
        let active: HashSet<String> = self
            .active_tools()?
            .into_iter()
            .map(|t| t.tool_key)
            .collect();

        let mut summaries = Vec::with_capacity(agents.len());
        for agent in agents {
            let optimizers = self.optimizers_for_agent_id(agent.id)?;
            let toon = match self.toon_config(&agent.name) {
                Ok(cfg) => ToonStatus { enabled: cfg.enabled, config_id: cfg.config_id },
                Err(AppError::NotFound(_)) => ToonStatus::default(),
                Err(e) => return Err(e),
            };
            let tools_count = catalog::recommended_for(agent.context)
                .iter()
                .filter(|key| active.contains(**key))
                .count() as u64;
            summaries.push(AgentSummary {
                id: agent.id,
                name: agent.name,
                description: agent.description,
                context: agent.context,
                optimizers,
                toon,
                tools_count,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use crate::agents::ROSTER;
    use crate::db::test_db;
    use crate::error::AppError;
    use crate::models::{AgentContext, OptimizerType};

    #[test]
    fn agents_listed_in_roster_order() {
        let (_temp, db) = test_db();
        let names: Vec<String> = db.list_agents().unwrap().into_iter().map(|a| a.name).collect();
        let expected: Vec<String> = ROSTER.iter().map(|s| s.name.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn agent_by_name_finds_and_misses() {
        let (_temp, db) = test_db();
        let a = db.agent_by_name("Study Agent").unwrap();
        assert_eq!(a.context, AgentContext::Study);
        assert!(matches!(db.agent_by_name("Ghost Agent"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn fresh_summaries_are_empty_but_well_formed() {
        let (_temp, db) = test_db();
        let summaries = db.agent_summaries().unwrap();
        assert_eq!(summaries.len(), ROSTER.len());
        for s in &summaries {
            assert!(s.optimizers.is_empty());
            assert!(!s.toon.enabled);
            assert_eq!(s.tools_count, 0);
        }
    }

    #[test]
    fn summaries_reflect_attached_records() {
        let (_temp, db) = test_db();
        db.create_optimizer("Study Agent", OptimizerType::Gepa, None, serde_json::json!({})).unwrap();
        db.create_toon_config("Study Agent", true, serde_json::json!({}), Some("cfg-1".into())).unwrap();
        db.register_tool("arxiv").unwrap();
        db.register_tool("shell_tools").unwrap();

        let study = db
            .agent_summaries()
            .unwrap()
            .into_iter()
            .find(|s| s.name == "Study Agent")
            .unwrap();
        assert_eq!(study.optimizers.len(), 1);
        assert!(study.toon.enabled);
        assert_eq!(study.toon.config_id.as_deref(), Some("cfg-1"));
        // shell_tools is active but never recommended
        assert_eq!(study.tools_count, 1);
    }
}
