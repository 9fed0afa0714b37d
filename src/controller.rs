//! Checklist state controller.
//!
//! Owns the canonical in-memory board for one project and mediates
//! between the presentation layer, the reorder engine, and the store.
//! Mutations apply synchronously and optimistically: the board changes
//! first, then a revision-stamped snapshot goes on the save queue. A
//! failed save is reported through the notice channel and the save-state
//! watch, never by rolling the board back.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, warn};

use crate::error::{Error, ErrorCode, Result};
use crate::model::{default_board, ChecklistItem, Comment, Section};
use crate::reorder::{self, Drag};
use crate::save::{SaveQueue, SaveState};
use crate::store::{ChecklistSnapshot, ChecklistStore};

/// Author recorded on new comments until real user identity is wired in.
const COMMENT_AUTHOR: &str = "Current User";

/// Where the initial load stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// `load` has not completed yet.
    Loading,
    /// The board reflects the store (or a fresh default board).
    Ready,
    /// The fetch failed; the board is an empty default so the UI stays
    /// usable, but nothing was read.
    Failed,
}

/// A transient user-visible notice.
///
/// The presentation layer drains these and renders them as toasts; the
/// code lets it word policy rejections differently from store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: ErrorCode,
    pub message: String,
}

impl Notice {
    pub(crate) fn load_failed(err: &Error) -> Self {
        Self {
            code: err.error_code(),
            message: format!("Could not load the checklist: {err}"),
        }
    }

    pub(crate) fn save_failed(err: &Error) -> Self {
        Self {
            code: err.error_code(),
            message: format!("Your changes could not be saved: {err}"),
        }
    }

    pub(crate) fn stale_write(stored_revision: i64) -> Self {
        Self {
            code: ErrorCode::StaleRevision,
            message: format!(
                "Your changes could not be saved: the stored checklist is already at revision {stored_revision}"
            ),
        }
    }

    pub(crate) fn policy(err: &Error) -> Self {
        Self {
            code: err.error_code(),
            message: err.to_string(),
        }
    }

    /// Whether this notice reports a policy rejection rather than a
    /// failure.
    #[must_use]
    pub fn is_policy(&self) -> bool {
        self.code.is_policy()
    }
}

/// In-memory checklist board for one project.
///
/// Intended usage is a single active controller per project; concurrent
/// editors elsewhere are last-write-wins at the store row, made visible
/// by the revision check.
pub struct ChecklistController<S: ChecklistStore + 'static> {
    project_id: String,
    sections: Vec<Section>,
    load_state: LoadState,
    revision: i64,
    store: Arc<Mutex<S>>,
    saver: SaveQueue,
    notice_tx: mpsc::UnboundedSender<Notice>,
    notice_rx: Option<mpsc::UnboundedReceiver<Notice>>,
}

impl<S: ChecklistStore + 'static> ChecklistController<S> {
    /// Create a controller owning its own store handle.
    ///
    /// Must be called from within a tokio runtime (the save task is
    /// spawned immediately).
    pub fn new(project_id: impl Into<String>, store: S) -> Self {
        Self::shared(project_id, Arc::new(Mutex::new(store)))
    }

    /// Create a controller over a shared store handle.
    pub fn shared(project_id: impl Into<String>, store: Arc<Mutex<S>>) -> Self {
        let project_id = project_id.into();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let saver = SaveQueue::spawn(project_id.clone(), Arc::clone(&store), notice_tx.clone());
        Self {
            project_id,
            sections: Vec::new(),
            load_state: LoadState::Loading,
            revision: 0,
            store,
            saver,
            notice_tx,
            notice_rx: Some(notice_rx),
        }
    }

    // ── Observation ───────────────────────────────────────────

    /// The current board, in display order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// True until the initial `load` completes.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Where the most recent save stands.
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.saver.state()
    }

    /// Subscribe to save-state transitions (pending/saved/failed).
    #[must_use]
    pub fn subscribe_save_state(&self) -> watch::Receiver<SaveState> {
        self.saver.subscribe()
    }

    /// Take the notice receiver. Yields `Some` exactly once.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notice_rx.take()
    }

    /// Revision of the current in-memory board.
    #[must_use]
    pub fn revision(&self) -> i64 {
        self.revision
    }

    // ── Load ──────────────────────────────────────────────────

    /// Fetch the board from the store.
    ///
    /// A project with no stored row gets the default three-column board,
    /// persisted as its first revision. A fetch failure leaves an empty
    /// default board, emits a notice, and marks the load failed; it is
    /// never propagated to the caller.
    pub async fn load(&mut self) {
        self.load_state = LoadState::Loading;
        let fetched = {
            let mut store = self.store.lock().await;
            store.fetch(&self.project_id)
        };

        match fetched {
            Ok(Some(record)) => {
                debug!(
                    project_id = %self.project_id,
                    revision = record.revision,
                    "checklist loaded"
                );
                self.sections = record.sections;
                self.revision = record.revision;
                self.load_state = LoadState::Ready;
            }
            Ok(None) => {
                debug!(project_id = %self.project_id, "no stored checklist; creating default board");
                self.sections = default_board();
                self.load_state = LoadState::Ready;
                self.persist();
            }
            Err(err) => {
                warn!(project_id = %self.project_id, "checklist load failed: {err}");
                let _ = self.notice_tx.send(Notice::load_failed(&err));
                self.sections = default_board();
                self.load_state = LoadState::Failed;
            }
        }
    }

    // ── Task operations ───────────────────────────────────────

    /// Append a new task to a section. No-op if the trimmed text is
    /// empty or the section is unknown.
    pub fn add_task(&mut self, section_id: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) else {
            return;
        };
        section.items.push(ChecklistItem::new(text.to_string()));
        self.persist();
    }

    /// Remove a task. No-op if the section or task is unknown.
    pub fn delete_task(&mut self, section_id: &str, task_id: &str) {
        let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) else {
            return;
        };
        let before = section.items.len();
        section.items.retain(|item| item.id != task_id);
        if section.items.len() != before {
            self.persist();
        }
    }

    /// Set a task's completion flag. No-op if not found.
    pub fn set_task_completed(&mut self, section_id: &str, task_id: &str, completed: bool) {
        if let Some(item) = self.find_item_mut(section_id, task_id) {
            item.completed = completed;
            self.persist();
        }
    }

    /// Replace a task's text. Unlike `add_task`, empty text is allowed.
    pub fn update_task_text(&mut self, section_id: &str, task_id: &str, text: &str) {
        if let Some(item) = self.find_item_mut(section_id, task_id) {
            item.text = text.to_string();
            self.persist();
        }
    }

    /// Append a comment to a task. No-op if the trimmed text is empty or
    /// the task is unknown.
    pub fn add_comment(&mut self, section_id: &str, task_id: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(item) = self.find_item_mut(section_id, task_id) {
            item.comments
                .push(Comment::new(text.to_string(), COMMENT_AUTHOR.to_string()));
            self.persist();
        }
    }

    // ── Section operations ────────────────────────────────────

    /// Replace a section's title. No-op if the trimmed title is empty or
    /// the section is unknown.
    pub fn rename_section(&mut self, section_id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        if let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) {
            section.title = title.to_string();
            self.persist();
        }
    }

    /// Append a new, deletable section. No-op if the trimmed title is
    /// empty.
    pub fn add_section(&mut self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        self.sections.push(Section::new(title.to_string()));
        self.persist();
    }

    /// Remove a section and all its tasks.
    ///
    /// No-op if the section is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtectedSection`] (and emits a policy notice)
    /// if the section is protected; the board is unchanged.
    pub fn delete_section(&mut self, section_id: &str) -> Result<()> {
        let Some(index) = self.sections.iter().position(|s| s.id == section_id) else {
            return Ok(());
        };
        if self.sections[index].protected {
            let err = Error::ProtectedSection {
                id: section_id.to_string(),
            };
            let _ = self.notice_tx.send(Notice::policy(&err));
            return Err(err);
        }
        self.sections.remove(index);
        self.persist();
        Ok(())
    }

    // ── Reorder ───────────────────────────────────────────────

    /// Apply a drag gesture from the presentation layer.
    ///
    /// No-op gestures (missing destination, unknown ids, stale indices)
    /// change nothing and trigger no save.
    pub fn apply_drag(&mut self, drag: &Drag) {
        if let Some(next) = reorder::apply_drag(&self.sections, drag) {
            self.apply_reorder(next);
        }
    }

    /// Install a new board arrangement and persist it.
    pub fn apply_reorder(&mut self, sections: Vec<Section>) {
        self.sections = sections;
        self.persist();
    }

    // ── Internals ─────────────────────────────────────────────

    fn find_item_mut(&mut self, section_id: &str, task_id: &str) -> Option<&mut ChecklistItem> {
        self.sections
            .iter_mut()
            .find(|s| s.id == section_id)?
            .items
            .iter_mut()
            .find(|item| item.id == task_id)
    }

    /// Bump the revision and queue the full board for writing.
    fn persist(&mut self) {
        self.revision += 1;
        self.saver.enqueue(ChecklistSnapshot {
            sections: self.sections.clone(),
            revision: self.revision,
        });
    }
}
