//! In-memory checklist store.
//!
//! Backs controller tests and any host that wants a board without a
//! database. Rows hold the serialized JSON form, so fetch exercises the
//! same tolerant decoding path as the SQLite store. Fault switches let
//! tests drive the load-failure and save-failure paths on demand.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::store::{decode_sections, ChecklistRecord, ChecklistSnapshot, ChecklistStore, UpsertOutcome};

#[derive(Debug, Clone)]
struct Row {
    sections_json: String,
    revision: i64,
    updated_at: DateTime<Utc>,
}

/// HashMap-backed checklist store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: HashMap<String, Row>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `fetch` fail.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent `upsert` fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of stored project rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ChecklistStore for MemoryStore {
    fn fetch(&mut self, project_id: &str) -> Result<Option<ChecklistRecord>> {
        if self.fail_reads {
            return Err(Error::Other("injected read failure".to_string()));
        }
        let Some(row) = self.rows.get(project_id) else {
            return Ok(None);
        };
        Ok(Some(ChecklistRecord {
            sections: decode_sections(&row.sections_json)?,
            revision: row.revision,
            updated_at: row.updated_at,
        }))
    }

    fn upsert(&mut self, project_id: &str, snapshot: &ChecklistSnapshot) -> Result<UpsertOutcome> {
        if self.fail_writes {
            return Err(Error::Other("injected write failure".to_string()));
        }
        if let Some(row) = self.rows.get(project_id) {
            if row.revision >= snapshot.revision {
                return Ok(UpsertOutcome::Stale {
                    stored_revision: row.revision,
                });
            }
        }
        self.rows.insert(
            project_id.to_string(),
            Row {
                sections_json: serde_json::to_string(&snapshot.sections)?,
                revision: snapshot.revision,
                updated_at: Utc::now(),
            },
        );
        Ok(UpsertOutcome::Written)
    }
}
