//! Checklist item and comment models.
//!
//! Items are the draggable task cards on the board; comments hang off an
//! item as an append-only sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a short prefixed id, e.g. `task_1a2b3c4d5e6f`.
pub(crate) fn short_id(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// A comment on a checklist item.
///
/// Append-only: comments are never edited or removed once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier (`cmt_` prefix).
    pub id: String,

    /// Comment body.
    pub text: String,

    /// Display name of the author.
    pub author: String,

    /// Creation timestamp, serialized as an ISO-8601 string.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment stamped with the current time.
    #[must_use]
    pub fn new(text: String, author: String) -> Self {
        Self {
            id: short_id("cmt"),
            text,
            author,
            created_at: Utc::now(),
        }
    }
}

/// A single task on the checklist board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Unique identifier (`task_` prefix). Unique across the whole
    /// board, not just within a section, so moves never collide.
    pub id: String,

    /// Task text.
    pub text: String,

    /// Completion flag, toggled in place.
    pub completed: bool,

    /// Comments in insertion order.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl ChecklistItem {
    /// Create a new, uncompleted task with no comments.
    #[must_use]
    pub fn new(text: String) -> Self {
        Self {
            id: short_id("task"),
            text,
            completed: false,
            comments: Vec::new(),
        }
    }

    /// Placeholder for a stored entry that failed to decode.
    ///
    /// Gets a fresh generated id so it stays addressable on the board.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: short_id("generated"),
            text: "Unnamed item".to_string(),
            completed: false,
            comments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item() {
        let item = ChecklistItem::new("Write spec".to_string());
        assert!(item.id.starts_with("task_"));
        assert_eq!(item.text, "Write spec");
        assert!(!item.completed);
        assert!(item.comments.is_empty());
    }

    #[test]
    fn test_placeholder_item() {
        let item = ChecklistItem::placeholder();
        assert!(item.id.starts_with("generated_"));
        assert_eq!(item.text, "Unnamed item");
        assert!(!item.completed);
    }

    #[test]
    fn test_comment_serializes_created_at_as_iso8601() {
        let comment = Comment::new("Looks good".to_string(), "Current User".to_string());
        let json = serde_json::to_value(&comment).unwrap();
        let created_at = json["createdAt"].as_str().unwrap();
        // RFC 3339 is the ISO-8601 profile chrono emits.
        assert!(created_at.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn test_item_round_trip() {
        let mut item = ChecklistItem::new("Review".to_string());
        item.comments
            .push(Comment::new("Done?".to_string(), "Current User".to_string()));

        let json = serde_json::to_string(&item).unwrap();
        let back: ChecklistItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_item_missing_comments_defaults_empty() {
        let back: ChecklistItem =
            serde_json::from_str(r#"{"id":"task_1","text":"x","completed":true}"#).unwrap();
        assert!(back.comments.is_empty());
        assert!(back.completed);
    }
}
