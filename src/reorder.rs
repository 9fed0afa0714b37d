//! Drag reorder engine.
//!
//! Pure transform from a drag gesture to a new board arrangement. No I/O,
//! no mutation of the input: callers own the returned value outright.
//! `None` means the gesture was a no-op (dropped outside a target, unknown
//! section id, or stale index) and nothing should change or be persisted.

use serde::{Deserialize, Serialize};

use crate::model::Section;

/// What a drag gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragScope {
    /// Reordering whole columns within the board.
    Section,
    /// Moving a task within or between columns.
    Task,
}

/// One end of a drag gesture.
///
/// For section-scope drags `list` is ignored and `index` addresses the
/// top-level section sequence; for task-scope drags `list` is a section
/// id and `index` addresses that section's item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    pub list: String,
    pub index: usize,
}

impl DragLocation {
    #[must_use]
    pub fn new(list: impl Into<String>, index: usize) -> Self {
        Self {
            list: list.into(),
            index,
        }
    }
}

/// A completed drag gesture as reported by the presentation layer.
///
/// `destination` is `None` when the drop landed outside any valid target
/// or the gesture was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drag {
    pub scope: DragScope,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

/// Apply a drag gesture to the board, returning the new arrangement.
///
/// Returns `None` for a no-op gesture: missing destination, unknown
/// section id, or an out-of-range source index (a stale gesture from a
/// view that has since changed). Insertion indices past the end of the
/// destination list clamp to an append.
#[must_use]
pub fn apply_drag(sections: &[Section], drag: &Drag) -> Option<Vec<Section>> {
    let destination = drag.destination.as_ref()?;
    match drag.scope {
        DragScope::Section => move_section(sections, drag.source.index, destination.index),
        DragScope::Task => move_task(sections, &drag.source, destination),
    }
}

/// Reorder the top-level section sequence. Section contents are untouched.
fn move_section(sections: &[Section], from: usize, to: usize) -> Option<Vec<Section>> {
    if from >= sections.len() {
        return None;
    }
    let mut next = sections.to_vec();
    let moved = next.remove(from);
    // Insertion index is computed after the removal, so `to` may equal
    // the shortened length for a move to the far end.
    let to = to.min(next.len());
    next.insert(to, moved);
    Some(next)
}

/// Move one task within a section or across two sections.
fn move_task(
    sections: &[Section],
    source: &DragLocation,
    destination: &DragLocation,
) -> Option<Vec<Section>> {
    let src_idx = sections.iter().position(|s| s.id == source.list)?;
    let dst_idx = sections.iter().position(|s| s.id == destination.list)?;
    if source.index >= sections[src_idx].items.len() {
        return None;
    }

    let mut next = sections.to_vec();
    let moved = next[src_idx].items.remove(source.index);
    let dst_items = &mut next[dst_idx].items;
    // For a same-section move the removal already happened, so the
    // destination index lands in the post-removal sequence.
    let at = destination.index.min(dst_items.len());
    dst_items.insert(at, moved);
    Some(next)
}
