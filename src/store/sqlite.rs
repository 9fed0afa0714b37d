//! SQLite-backed checklist store.
//!
//! One row per project in `project_checklists`. The board is stored as a
//! JSON array of serialized sections alongside a monotonic revision; the
//! upsert compares revisions and writes inside a single IMMEDIATE
//! transaction so the check-then-write is one logical operation.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::error::Result;
use crate::store::{decode_sections, ChecklistRecord, ChecklistSnapshot, ChecklistStore, UpsertOutcome};

/// The complete SQL schema for the checklist database.
///
/// Timestamps are stored as ISO-8601 TEXT so the row stays readable and
/// round-trips losslessly through the serialization contract.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS project_checklists (
    project_id TEXT PRIMARY KEY,
    sections   TEXT NOT NULL,
    revision   INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
";

/// SQLite-based checklist store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies the schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema fails to apply.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema fails to apply.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl ChecklistStore for SqliteStore {
    fn fetch(&mut self, project_id: &str) -> Result<Option<ChecklistRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT sections, revision, updated_at FROM project_checklists WHERE project_id = ?1",
                [project_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((raw_sections, revision, raw_updated_at)) = row else {
            return Ok(None);
        };

        let updated_at = raw_updated_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|err| {
                warn!(project_id, "unparseable updated_at ({err}); defaulting to now");
                Utc::now()
            });

        Ok(Some(ChecklistRecord {
            sections: decode_sections(&raw_sections)?,
            revision,
            updated_at,
        }))
    }

    fn upsert(&mut self, project_id: &str, snapshot: &ChecklistSnapshot) -> Result<UpsertOutcome> {
        let sections = serde_json::to_string(&snapshot.sections)?;
        let now = Utc::now().to_rfc3339();

        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let stored: Option<i64> = tx
            .query_row(
                "SELECT revision FROM project_checklists WHERE project_id = ?1",
                [project_id],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(stored_revision) if stored_revision >= snapshot.revision => {
                // A newer save already landed; drop this one.
                return Ok(UpsertOutcome::Stale { stored_revision });
            }
            Some(_) => {
                tx.execute(
                    "UPDATE project_checklists SET sections = ?2, revision = ?3, updated_at = ?4
                     WHERE project_id = ?1",
                    rusqlite::params![project_id, sections, snapshot.revision, now],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO project_checklists (project_id, sections, revision, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![project_id, sections, snapshot.revision, now],
                )?;
            }
        }

        tx.commit()?;
        Ok(UpsertOutcome::Written)
    }
}
