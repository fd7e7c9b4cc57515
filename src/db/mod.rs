//! SQLite persistence for agents, optimizers, Toon configs, tools, the task
//! list and calendar events.
//!
//! [`Database`] only holds the file path. Every operation opens its own
//! connection, so the value is cheap to clone into handlers and blocking
//! work can be shipped to [`Database::run`].

mod agents;
mod events;
mod optimizers;
mod tasks;
mod toon_configs;
mod tools;

pub use events::NewEvent;
pub use tasks::{NewTask, TaskFilter};

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::agents::ROSTER;
use crate::error::AppError;

/// Stored in `PRAGMA user_version`. Bump it and add a step to
/// `init_schema` when the DDL changes.
const SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database at `path`, bring the schema up
    /// to date and seed the agent roster.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let db = Self { path: path.to_path_buf() };
        db.init_schema()?;
        db.seed_agents()?;
        info!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run blocking store work on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| AppError::Database(format!("blocking task join: {e}")))?
    }

    /// Cheap liveness check for `/health`.
    pub fn ping(&self) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| AppError::Database(format!("ping: {e}")))?;
        Ok(())
    }

    fn init_schema(&self) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("read schema version: {e}")))?;

        if version > SCHEMA_VERSION {
            return Err(AppError::Database(format!(
                "unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        if version < 1 {
            conn.execute_batch(SCHEMA_V1)
                .map_err(|e| AppError::Database(format!("initialize schema: {e}")))?;
            debug!("schema created at version 1");
        }
        if version < 2 {
            conn.execute_batch(SCHEMA_V2)
                .map_err(|e| AppError::Database(format!("migrate schema to v2: {e}")))?;
            debug!(from = version, "schema migrated to version 2");
        }
        Ok(())
    }

    fn seed_agents(&self) -> Result<(), AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(format!("begin seed tx: {e}")))?;
        let now = now_iso8601();
        for agent in ROSTER {
            tx.execute(
                "INSERT OR IGNORE INTO agents (name, description, context, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![agent.name, agent.description, agent.context.as_str(), now],
            )
            .map_err(|e| AppError::Database(format!("seed agent {}: {e}", agent.name)))?;
        }
        tx.commit()
            .map_err(|e| AppError::Database(format!("commit seed: {e}")))?;
        Ok(())
    }

    fn open_conn(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.path)
            .map_err(|e| AppError::Database(format!("open {}: {e}", self.path.display())))?;

        // busy_timeout first so concurrent openers wait on the WAL switch.
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| AppError::Database(format!("set busy_timeout: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Database(format!("set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| AppError::Database(format!("set foreign_keys ON: {e}")))?;

        Ok(conn)
    }
}

const SCHEMA_V1: &str = "
    CREATE TABLE IF NOT EXISTS agents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL,
        context TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS optimizers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_id INTEGER NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
        optimizer_type TEXT NOT NULL,
        name TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        config TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_optimizers_agent ON optimizers(agent_id);

    CREATE TABLE IF NOT EXISTS toon_configs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_id INTEGER NOT NULL UNIQUE REFERENCES agents(id) ON DELETE CASCADE,
        enabled INTEGER NOT NULL,
        config TEXT NOT NULL,
        config_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tools (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tool_key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    PRAGMA user_version = 1;
";

/// Task list and calendar.
const SCHEMA_V2: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        priority TEXT NOT NULL,
        category TEXT NOT NULL,
        deadline TEXT,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        completed_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status, priority);

    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        category TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_time);

    PRAGMA user_version = 2;
";

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Shorthand for mapping rusqlite errors with an operation label.
fn db_err(op: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
    move |e| AppError::Database(format!("{op}: {e}"))
}

/// Text column parsed through `FromStr` (enum columns).
fn text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// JSON text column.
fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Database) {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let db = Database::open(&temp.path().join("effectiva.db")).expect("open db");
    (temp, db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_dirs_and_seeds_roster() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("e.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.list_agents().unwrap().len(), ROSTER.len());
    }

    #[test]
    fn reopen_does_not_duplicate_agents() {
        let (temp, db) = test_db();
        drop(db);
        let db = Database::open(&temp.path().join("effectiva.db")).unwrap();
        assert_eq!(db.list_agents().unwrap().len(), ROSTER.len());
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let (_temp, db) = test_db();
        db.open_conn().unwrap().pragma_update(None, "user_version", 7).unwrap();
        let err = Database::open(db.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 7"));
    }

    #[test]
    fn version_one_database_is_migrated() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("v1.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA_V1).unwrap();
        }
        let db = Database::open(&path).unwrap();
        let version: i64 = db
            .open_conn()
            .unwrap()
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        assert!(db.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn ping_succeeds() {
        let (_temp, db) = test_db();
        db.ping().unwrap();
    }

    #[tokio::test]
    async fn run_executes_on_blocking_pool() {
        let (_temp, db) = test_db();
        let n = db.run(|db| db.list_agents().map(|a| a.len())).await.unwrap();
        assert_eq!(n, ROSTER.len());
    }

    #[tokio::test]
    async fn run_propagates_errors() {
        let (_temp, db) = test_db();
        let err = db
            .run(|db| db.agent_by_name("Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
