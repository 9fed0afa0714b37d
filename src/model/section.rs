//! Board sections.
//!
//! A section is an ordered column of checklist items. The board itself is
//! just an ordered `Vec<Section>`; section order is significant and
//! persisted. Three protected defaults exist on every board and cannot be
//! deleted; protection is an explicit flag on the record, not a property
//! of any particular id.

use serde::{Deserialize, Serialize};

use crate::model::item::{short_id, ChecklistItem};

/// A named, ordered column of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier (`sect_` prefix for user sections; the defaults
    /// keep their well-known ids).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Protected sections cannot be deleted.
    #[serde(default)]
    pub protected: bool,

    /// Tasks in display order.
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Section {
    /// Create a new, empty user section (deletable).
    #[must_use]
    pub fn new(title: String) -> Self {
        Self {
            id: short_id("sect"),
            title,
            protected: false,
            items: Vec::new(),
        }
    }

    /// Create a protected default section with a well-known id.
    #[must_use]
    pub fn protected(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            protected: true,
            items: Vec::new(),
        }
    }
}

/// The default three-column board created on first load of a project.
#[must_use]
pub fn default_board() -> Vec<Section> {
    vec![
        Section::protected("todo", "To Do"),
        Section::protected("in_progress", "In Progress"),
        Section::protected("done", "Done"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_board() {
        let board = default_board();
        let ids: Vec<&str> = board.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["todo", "in_progress", "done"]);
        assert!(board.iter().all(|s| s.protected && s.items.is_empty()));
    }

    #[test]
    fn test_user_section_is_deletable() {
        let section = Section::new("Blocked".to_string());
        assert!(section.id.starts_with("sect_"));
        assert!(!section.protected);
    }

    #[test]
    fn test_section_round_trip() {
        let mut section = Section::new("Review".to_string());
        section.items.push(ChecklistItem::new("Read diff".to_string()));

        let json = serde_json::to_string(&section).unwrap();
        let back: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(back, section);
    }

    #[test]
    fn test_missing_protected_flag_defaults_false() {
        let back: Section =
            serde_json::from_str(r#"{"id":"sect_1","title":"Extra","items":[]}"#).unwrap();
        assert!(!back.protected);
    }
}
