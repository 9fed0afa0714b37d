//! taskboard - project checklist core
//!
//! The board for one project is an ordered list of sections, each an
//! ordered list of tasks. Three protected default sections exist on
//! every board; user sections can be added and deleted. Drag gestures
//! are resolved by a pure reorder engine, mutations apply optimistically
//! in memory, and a queued save task writes revision-stamped snapshots
//! to a keyed record store.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Section, ChecklistItem, Comment)
//! - [`reorder`] - Pure drag-reorder engine
//! - [`controller`] - Checklist state controller
//! - [`save`] - Queued save path with surfaced save-state
//! - [`store`] - Persistence adapters (SQLite, in-memory)
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod controller;
pub mod error;
pub mod model;
pub mod reorder;
pub mod save;
pub mod store;

pub use controller::{ChecklistController, LoadState, Notice};
pub use error::{Error, ErrorCode, Result};
pub use model::{default_board, ChecklistItem, Comment, Section};
pub use reorder::{apply_drag, Drag, DragLocation, DragScope};
pub use save::SaveState;
pub use store::{ChecklistStore, MemoryStore, SqliteStore};
