//! SQLite-backed persistence.
//!
//! Provides persistent storage for:
//! - The session snapshot (survey result, tasks, achievements, challenges,
//!   waterprint profile) as JSON in a key-value table
//! - An outbox of ledger updates for the backend profile API

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{data_dir, migrations, SessionStore};
use crate::error::{DatabaseError, Result};
use crate::ledger::RemoteUpdate;
use crate::session::SessionState;

const SESSION_KEY: &str = "session";

const SET_KV_SQL: &str = "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)";
const ENQUEUE_SQL: &str = "INSERT INTO remote_updates (task_id, waterprint_reduction, queued_at)
     VALUES (?1, ?2, ?3)";

/// A queued backend update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedUpdate {
    pub id: i64,
    pub update: RemoteUpdate,
    pub queued_at: DateTime<Utc>,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/waterprint.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("waterprint.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(SET_KV_SQL, params![key, value])?;
        Ok(())
    }

    /// Queue a ledger update for the backend.
    pub fn enqueue_update(&self, update: &RemoteUpdate, at: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            ENQUEUE_SQL,
            params![update.task_id, update.waterprint_reduction, at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Save the session and queue `updates` in one transaction.
    ///
    /// Either both land or neither does.
    pub fn save_with_updates(
        &mut self,
        state: &SessionState,
        updates: &[RemoteUpdate],
        at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let tx = self.conn.transaction()?;
        for update in updates {
            tx.execute(
                ENQUEUE_SQL,
                params![update.task_id, update.waterprint_reduction, at.to_rfc3339()],
            )?;
        }
        tx.execute(SET_KV_SQL, params![SESSION_KEY, json])?;
        tx.commit()?;
        debug!(bytes = json.len(), queued = updates.len(), "session saved");
        Ok(())
    }

    /// Updates not yet acknowledged, oldest first.
    pub fn pending_updates(&self) -> Result<Vec<QueuedUpdate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, waterprint_reduction, queued_at
             FROM remote_updates
             WHERE synced_at IS NULL
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut queued = Vec::new();
        for row in rows {
            let (id, task_id, waterprint_reduction, queued_at) = row?;
            let queued_at = DateTime::parse_from_rfc3339(&queued_at)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad queued_at: {e}")))?
                .with_timezone(&Utc);
            queued.push(QueuedUpdate {
                id,
                update: RemoteUpdate {
                    task_id,
                    waterprint_reduction,
                },
                queued_at,
            });
        }
        Ok(queued)
    }

    /// Mark a queued update as delivered.
    pub fn mark_synced(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE remote_updates SET synced_at = ?1 WHERE id = ?2 AND synced_at IS NULL",
            params![at.to_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }
}

impl SessionStore for Database {
    fn load(&self) -> Result<SessionState> {
        match self.kv_get(SESSION_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(SessionState::default()),
        }
    }

    fn save(&mut self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(SESSION_KEY, &json)?;
        debug!(bytes = json.len(), "session saved");
        Ok(())
    }
}
