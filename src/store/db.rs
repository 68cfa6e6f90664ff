// SQLite database setup and migrations
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::StoreResult;

/// File name of the per-session database, inside the session folder
pub const SESSION_DB_FILE: &str = "derived.sqlite";

// Thread-safe database connection wrapper
pub struct DbConnection {
    conn: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// A poisoned lock still holds a usable connection; SQLite keeps its own consistency
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clone for DbConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Open (creating if needed) the store of the session at `session_dir`
pub fn open_session_db(session_dir: &Path) -> StoreResult<DbConnection> {
    std::fs::create_dir_all(session_dir)?;
    let db_path = session_dir.join(SESSION_DB_FILE);

    let conn = Connection::open(&db_path)?;
    run_migrations(&conn)?;
    log::debug!("Opened session store {}", db_path.display());

    Ok(DbConnection::new(conn))
}

pub fn open_in_memory() -> StoreResult<DbConnection> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(DbConnection::new(conn))
}

fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        migration_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [1])?;
    }

    Ok(())
}

fn migration_v1(conn: &Connection) -> StoreResult<()> {
    // Derived series, one JSON value per key
    conn.execute(
        "CREATE TABLE IF NOT EXISTS derived_series (
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // Raw inputs the derived series were computed from
    conn.execute(
        "CREATE TABLE IF NOT EXISTS artifacts (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            path TEXT NOT NULL,
            sha256 TEXT NOT NULL,
            bytes INTEGER NOT NULL,
            recorded_at TEXT NOT NULL
        )",
        [],
    )?;

    // One row per input file and role
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_artifacts_kind_path ON artifacts(kind, path)",
        [],
    )?;

    Ok(())
}
