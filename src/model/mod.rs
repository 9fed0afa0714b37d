//! Data types for the checklist board.
//!
//! - [`item`] - Tasks and their comments
//! - [`section`] - Board columns and the default three-column board

pub mod item;
pub mod section;

pub use item::{ChecklistItem, Comment};
pub use section::{default_board, Section};
