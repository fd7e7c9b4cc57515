use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::{Database, db_err, now_iso8601, text_column};
use crate::catalog::{self, BUILTIN_TOOLS, CatalogEntry};
use crate::error::AppError;
use crate::models::{Tool, ToolCategory};

const TOOL_COLUMNS: &str = "id, tool_key, name, description, category, is_active, created_at, updated_at";

fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        tool_key: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category: text_column(row, 4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn find_by_key(conn: &Connection, key: &str) -> Result<Option<Tool>, AppError> {
    conn.query_row(
        &format!("SELECT {TOOL_COLUMNS} FROM tools WHERE tool_key = ?1"),
        params![key],
        tool_from_row,
    )
    .optional()
    .map_err(db_err("lookup tool"))
}

/// Insert the catalog entry unless a row with its key exists; returns the
/// row either way. `INSERT OR IGNORE` keeps concurrent registrations of the
/// same key from tripping the unique constraint.
fn upsert_entry(conn: &Connection, entry: &CatalogEntry) -> Result<Tool, AppError> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO tools (tool_key, name, description, category, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            params![entry.key, entry.name, entry.description, entry.category.as_str(), now_iso8601()],
        )
        .map_err(db_err("insert tool"))?;
    if inserted > 0 {
        info!(tool = entry.key, "tool registered");
    }
    find_by_key(conn, entry.key)?
        .ok_or_else(|| AppError::Database(format!("tool {} vanished after insert", entry.key)))
}

impl Database {
    /// Register one catalog tool. Registering twice returns the existing row.
    pub fn register_tool(&self, key: &str) -> Result<Tool, AppError> {
        let entry = catalog::lookup(key.trim())
            .ok_or_else(|| AppError::NotFound(format!("tool '{key}' is not in the catalog")))?;
        let conn = self.open_conn()?;
        upsert_entry(&conn, entry)
    }

    /// Register the whole catalog in one transaction.
    pub fn register_all_tools(&self) -> Result<Vec<Tool>, AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn.transaction().map_err(db_err("begin register_all_tools"))?;
        let tools = BUILTIN_TOOLS
            .iter()
            .map(|entry| upsert_entry(&tx, entry))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit().map_err(db_err("commit register_all_tools"))?;
        Ok(tools)
    }

    pub fn active_tools(&self) -> Result<Vec<Tool>, AppError> {
        self.select_tools("WHERE is_active = 1 ORDER BY id", params![])
    }

    pub fn tools_by_category(&self, category: ToolCategory) -> Result<Vec<Tool>, AppError> {
        self.select_tools(
            "WHERE is_active = 1 AND category = ?1 ORDER BY id",
            params![category.as_str()],
        )
    }

    /// Keys of every registered tool, active or not.
    pub fn registered_tool_keys(&self) -> Result<HashSet<String>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare("SELECT tool_key FROM tools")
            .map_err(db_err("prepare registered_tool_keys"))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err("query registered_tool_keys"))?;
        rows.collect::<Result<HashSet<_>, _>>()
            .map_err(db_err("read tool key"))
    }

    /// Set the active flag. Setting it to its current value is a no-op.
    pub fn set_tool_active(&self, id: i64, active: bool) -> Result<Tool, AppError> {
        let conn = self.open_conn()?;
        let updated = conn
            .execute(
                "UPDATE tools SET is_active = ?2, updated_at = ?3 WHERE id = ?1 AND is_active != ?2",
                params![id, active, now_iso8601()],
            )
            .map_err(db_err("toggle tool"))?;
        let tool = conn
            .query_row(
                &format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = ?1"),
                params![id],
                tool_from_row,
            )
            .optional()
            .map_err(db_err("lookup tool"))?
            .ok_or_else(|| AppError::NotFound(format!("tool {id}")))?;
        if updated > 0 {
            info!(id, tool = %tool.tool_key, active, "tool toggled");
        }
        Ok(tool)
    }

    fn select_tools(&self, clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Tool>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TOOL_COLUMNS} FROM tools {clause}"))
            .map_err(db_err("prepare select tools"))?;
        let rows = stmt
            .query_map(params, tool_from_row)
            .map_err(db_err("query tools"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(db_err("read tool row"))
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::BUILTIN_TOOLS;
    use crate::db::test_db;
    use crate::error::AppError;
    use crate::models::ToolCategory;

    #[test]
    fn register_copies_catalog_entry() {
        let (_temp, db) = test_db();
        let t = db.register_tool("wikipedia").unwrap();
        assert_eq!(t.tool_key, "wikipedia");
        assert_eq!(t.category, ToolCategory::Web);
        assert!(t.is_active);
    }

    #[test]
    fn register_twice_returns_same_row() {
        let (_temp, db) = test_db();
        let a = db.register_tool("calculator").unwrap();
        let b = db.register_tool("calculator").unwrap();
        assert_eq!(a, b);
        assert_eq!(db.active_tools().unwrap().len(), 1);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let (_temp, db) = test_db();
        assert!(matches!(db.register_tool("telnet"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn register_all_is_idempotent() {
        let (_temp, db) = test_db();
        db.register_tool("arxiv").unwrap();
        let first = db.register_all_tools().unwrap();
        let second = db.register_all_tools().unwrap();
        assert_eq!(first.len(), BUILTIN_TOOLS.len());
        assert_eq!(first, second);
        assert_eq!(db.registered_tool_keys().unwrap().len(), BUILTIN_TOOLS.len());
    }

    #[test]
    fn category_listing_only_shows_active_rows() {
        let (_temp, db) = test_db();
        db.register_all_tools().unwrap();
        let web = db.tools_by_category(ToolCategory::Web).unwrap();
        assert_eq!(web.len(), 3);
        db.set_tool_active(web[0].id, false).unwrap();
        assert_eq!(db.tools_by_category(ToolCategory::Web).unwrap().len(), 2);
        assert_eq!(db.active_tools().unwrap().len(), BUILTIN_TOOLS.len() - 1);
    }

    #[test]
    fn toggle_is_idempotent() {
        let (_temp, db) = test_db();
        let t = db.register_tool("file_tools").unwrap();
        let again = db.set_tool_active(t.id, true).unwrap();
        assert_eq!(again, t);
        let off = db.set_tool_active(t.id, false).unwrap();
        assert!(!off.is_active);
        assert!(!db.set_tool_active(t.id, false).unwrap().is_active);
        assert!(matches!(db.set_tool_active(404, true), Err(AppError::NotFound(_))));
    }

    #[test]
    fn reregistering_keeps_deactivated_state() {
        let (_temp, db) = test_db();
        let t = db.register_tool("shell_tools").unwrap();
        db.set_tool_active(t.id, false).unwrap();
        assert!(!db.register_tool("shell_tools").unwrap().is_active);
    }

    #[test]
    fn concurrent_registration_of_one_key_succeeds_everywhere() {
        let (_temp, db) = test_db();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || db.register_tool("calculator"))
            })
            .collect();
        let ids: Vec<i64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().id)
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(db.registered_tool_keys().unwrap().len(), 1);
    }
}
