//! SQLite-based state storage and event journal.
//!
//! Provides persistent storage for:
//! - Key-value store backing [`Preferences`](super::Preferences), wake timers
//!   and the retry job
//! - Append-only journal of core [`Event`]s

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::events::{Event, EventSink};

use super::{data_dir, KvStore};

/// One journal row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub kind: String,
    pub event: serde_json::Value,
    pub recorded_at: NaiveDateTime,
}

/// Default number of journal rows kept.
pub const JOURNAL_LIMIT: usize = 5000;

/// SQLite database for runtime state.
pub struct Database {
    conn: Mutex<Connection>,
    journal_limit: usize,
}

impl Database {
    /// Open the database at `~/.config/prayermute/prayermute.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::open_at(&dir.join("prayermute.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
            journal_limit: JOURNAL_LIMIT,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            journal_limit: JOURNAL_LIMIT,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Keep at most `limit` journal rows (at least one).
    pub fn with_journal_limit(mut self, limit: usize) -> Self {
        self.journal_limit = limit.max(1);
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL,
                payload     TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_recorded_at ON events(recorded_at);
            CREATE INDEX IF NOT EXISTS idx_events_kind ON events(kind);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Append an event to the journal, pruning the oldest rows beyond the
    /// journal limit.
    ///
    /// # Errors
    /// Returns an error if the event cannot be serialized or inserted.
    pub fn record_event(&self, event: &Event) -> Result<i64, StoreError> {
        let payload = serde_json::to_string(event).map_err(|e| StoreError::Encoding {
            key: event.kind().to_string(),
            message: e.to_string(),
        })?;
        let recorded_at = Local::now().naive_local();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO events (kind, payload, recorded_at) VALUES (?1, ?2, ?3)",
            params![
                event.kind(),
                payload,
                recorded_at.format("%Y-%m-%dT%H:%M:%S").to_string()
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.execute(
            "DELETE FROM events WHERE id <= ?1 - ?2",
            params![id, self.journal_limit as i64],
        )?;
        Ok(id)
    }

    /// Most recent journal entries, newest first.
    pub fn recent_events(&self, limit: usize) -> Result<Vec<JournalEntry>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, kind, payload, recorded_at
             FROM events
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, kind, payload, recorded_at) = row?;
            // Unreadable rows are skipped rather than failing the listing.
            let Ok(event) = serde_json::from_str(&payload) else {
                warn!(id, kind = %kind, "skipping undecodable journal row");
                continue;
            };
            let Ok(recorded_at) = NaiveDateTime::parse_from_str(&recorded_at, "%Y-%m-%dT%H:%M:%S")
            else {
                continue;
            };
            entries.push(JournalEntry {
                id,
                kind,
                event,
                recorded_at,
            });
        }
        Ok(entries)
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Ok(self.kv_remove(key)?)
    }
}

impl EventSink for Database {
    fn emit(&self, event: &Event) {
        if let Err(e) = self.record_event(event) {
            warn!(kind = event.kind(), error = %e, "failed to journal event");
        }
    }
}
