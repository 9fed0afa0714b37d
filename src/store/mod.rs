//! Persistence layer for checklist boards.
//!
//! One record per project, addressed by project id. The [`ChecklistStore`]
//! trait only needs point lookup and check-then-write upsert, so any
//! keyed record store can stand behind it.
//!
//! # Submodules
//!
//! - [`sqlite`] - SQLite-backed store
//! - [`memory`] - In-memory store with fault injection, for tests

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::model::{ChecklistItem, Comment, Section};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored checklist row as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistRecord {
    /// Ordered board sections.
    pub sections: Vec<Section>,

    /// Revision of the last write that produced this row.
    pub revision: i64,

    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

/// A board snapshot queued for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistSnapshot {
    pub sections: Vec<Section>,

    /// Monotonically increasing per-project revision. The store rejects
    /// writes that do not advance the stored revision.
    pub revision: i64,
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The snapshot was written.
    Written,
    /// The stored row already carries this revision or a newer one; the
    /// snapshot was dropped. Not an error: out-of-order completions of
    /// coalesced saves are expected.
    Stale { stored_revision: i64 },
}

/// A keyed record store holding one checklist row per project.
pub trait ChecklistStore: Send {
    /// Fetch the stored board for a project, or `None` if the project
    /// has never been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails. Malformed stored
    /// entries are defaulted in place, not surfaced as errors.
    fn fetch(&mut self, project_id: &str) -> Result<Option<ChecklistRecord>>;

    /// Write a snapshot, creating the row if the project has none.
    ///
    /// Must be a single logical check-then-write: the revision
    /// comparison and the write happen atomically with respect to other
    /// writers on the same store handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn upsert(&mut self, project_id: &str, snapshot: &ChecklistSnapshot) -> Result<UpsertOutcome>;
}

// ── Tolerant decoding ─────────────────────────────────────────

/// Decode a stored sections column.
///
/// Individual malformed entries are defaulted in place with a logged
/// diagnostic; one corrupt item never invalidates the rest of the board.
///
/// # Errors
///
/// Returns an error only if the column is not valid JSON at all.
pub(crate) fn decode_sections(raw: &str) -> Result<Vec<Section>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(entries) = value else {
        warn!("stored sections column is not an array; starting empty");
        return Ok(Vec::new());
    };
    Ok(entries.iter().map(decode_section).collect())
}

fn decode_section(value: &Value) -> Section {
    let Some(map) = value.as_object() else {
        warn!("malformed section entry: {value}");
        return Section::new("Untitled section".to_string());
    };

    let id = match map.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            warn!("section entry missing id; generating one");
            crate::model::item::short_id("sect")
        }
    };

    let items = map
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(decode_item).collect())
        .unwrap_or_default();

    Section {
        id,
        title: title_or_default(map),
        protected: map.get("protected").and_then(Value::as_bool).unwrap_or(false),
        items,
    }
}

fn title_or_default(map: &serde_json::Map<String, Value>) -> String {
    map.get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled section")
        .to_string()
}

fn decode_item(value: &Value) -> ChecklistItem {
    let required = value.as_object().filter(|map| {
        map.get("id").is_some_and(Value::is_string) && map.get("text").is_some_and(Value::is_string)
    });
    let Some(map) = required else {
        warn!("malformed checklist item: {value}");
        return ChecklistItem::placeholder();
    };

    let comments = map
        .get("comments")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| match serde_json::from_value::<Comment>(entry.clone()) {
                    Ok(comment) => Some(comment),
                    Err(err) => {
                        warn!("dropping malformed comment: {err}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    ChecklistItem {
        id: map["id"].as_str().unwrap_or_default().to_string(),
        text: map["text"].as_str().unwrap_or_default().to_string(),
        completed: map.get("completed").and_then(Value::as_bool).unwrap_or(false),
        comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_board;

    #[test]
    fn test_decode_round_trip() {
        let mut board = default_board();
        board[0].items.push(ChecklistItem::new("Write spec".to_string()));
        board[0].items[0]
            .comments
            .push(Comment::new("note".to_string(), "Current User".to_string()));

        let raw = serde_json::to_string(&board).unwrap();
        let back = decode_sections(&raw).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_item_missing_text_becomes_placeholder() {
        let raw = r#"[{
            "id": "todo", "title": "To Do", "protected": true,
            "items": [
                {"id": "task_1", "completed": true},
                {"id": "task_2", "text": "fine", "completed": false, "comments": []}
            ]
        }]"#;

        let board = decode_sections(raw).unwrap();
        assert_eq!(board[0].items.len(), 2);
        assert_eq!(board[0].items[0].text, "Unnamed item");
        assert!(!board[0].items[0].completed);
        assert!(board[0].items[0].comments.is_empty());
        // The valid neighbor loads unchanged.
        assert_eq!(board[0].items[1].id, "task_2");
        assert_eq!(board[0].items[1].text, "fine");
    }

    #[test]
    fn test_section_missing_title_defaults() {
        let raw = r#"[{"id": "sect_9", "items": []}]"#;
        let board = decode_sections(raw).unwrap();
        assert_eq!(board[0].id, "sect_9");
        assert_eq!(board[0].title, "Untitled section");
        assert!(!board[0].protected);
    }

    #[test]
    fn test_malformed_comment_is_dropped_not_fatal() {
        let raw = r#"[{
            "id": "todo", "title": "To Do",
            "items": [{"id": "task_1", "text": "x",
                       "comments": [{"id": "cmt_1"}, 42]}]
        }]"#;
        let board = decode_sections(raw).unwrap();
        assert!(board[0].items[0].comments.is_empty());
    }

    #[test]
    fn test_non_array_column_starts_empty() {
        assert!(decode_sections("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(decode_sections("not json").is_err());
    }
}
