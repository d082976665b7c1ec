//! Store handle for concept state.
//!
//! The persistent store is an externally owned resource: it is opened once,
//! injected into each concept instance at construction, and held for the
//! instance's lifetime. Concepts never reach for it through ambient/global
//! lookup. Connection bootstrap beyond the pragmas below (credentials,
//! replication, reconnection) belongs to the embedding application.

use crate::core::error::AtollError;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_DB_NAME: &str = "atoll.db";
pub const INVOCATION_LOG_NAME: &str = "invocations.jsonl";

/// Handle to a store root. All concept collections bound against this handle
/// live in one SQLite database under `root`.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the store root directory.
    pub root: PathBuf,
}

impl Store {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, AtollError> {
        fs::create_dir_all(root).map_err(|e| {
            AtollError::StoreInitializationError(format!("{}: {}", root.display(), e))
        })?;
        let store = Store { root: root.to_path_buf() };
        // Touch the database so pragmas are applied from the first use.
        db_connect(&store.db_path())?;
        Ok(store)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(STATE_DB_NAME)
    }

    pub fn invocation_log_path(&self) -> PathBuf {
        self.root.join(INVOCATION_LOG_NAME)
    }
}

pub fn db_connect(db_path: &Path) -> Result<Connection, AtollError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(AtollError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(AtollError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(AtollError::RusqliteError)?;
    Ok(conn)
}
