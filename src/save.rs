//! Queued save path.
//!
//! Each controller owns one save queue: a detached task that drains
//! board snapshots, coalesces bursts down to the newest revision, and
//! writes through the store. Save state is published on a watch channel
//! so the presentation layer can show pending/saved/failed instead of
//! guessing. Failures are reported as notices and logged; in-memory
//! state is never rolled back.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, warn};

use crate::controller::Notice;
use crate::store::{ChecklistSnapshot, ChecklistStore, UpsertOutcome};

/// Where the most recent save attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Nothing has been queued yet.
    Idle,
    /// A snapshot is queued or being written.
    Pending,
    /// The store holds this revision.
    Saved { revision: i64 },
    /// The store already holds a newer revision written elsewhere; the
    /// snapshot was dropped and the local edit is not persisted.
    Conflict { stored_revision: i64 },
    /// The last write failed; the local board still has the edit.
    Failed,
}

/// Handle to a per-project save task.
///
/// Dropping the handle closes the queue; an in-flight write completes or
/// fails with a logged diagnostic only.
pub(crate) struct SaveQueue {
    tx: mpsc::UnboundedSender<ChecklistSnapshot>,
    state_rx: watch::Receiver<SaveState>,
}

impl SaveQueue {
    /// Spawn the save task for one project.
    ///
    /// The store handle is shared with the controller's load path; the
    /// task only holds the lock for the duration of a single upsert.
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<S>(
        project_id: String,
        store: Arc<Mutex<S>>,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self
    where
        S: ChecklistStore + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChecklistSnapshot>();
        let (state_tx, state_rx) = watch::channel(SaveState::Idle);

        tokio::spawn(async move {
            while let Some(mut snapshot) = rx.recv().await {
                // Coalesce a burst of edits down to the newest snapshot.
                while let Ok(newer) = rx.try_recv() {
                    snapshot = newer;
                }

                let _ = state_tx.send(SaveState::Pending);
                let outcome = {
                    let mut store = store.lock().await;
                    store.upsert(&project_id, &snapshot)
                };

                match outcome {
                    Ok(UpsertOutcome::Written) => {
                        debug!(%project_id, revision = snapshot.revision, "checklist saved");
                        let _ = state_tx.send(SaveState::Saved {
                            revision: snapshot.revision,
                        });
                    }
                    Ok(UpsertOutcome::Stale { stored_revision }) => {
                        // The stored row is ahead of us, so this edit did
                        // not land. Tell the user instead of claiming a
                        // save happened.
                        warn!(
                            %project_id,
                            revision = snapshot.revision,
                            stored_revision,
                            "dropped stale checklist save"
                        );
                        let _ = notices.send(Notice::stale_write(stored_revision));
                        let _ = state_tx.send(SaveState::Conflict { stored_revision });
                    }
                    Err(err) => {
                        warn!(%project_id, revision = snapshot.revision, "checklist save failed: {err}");
                        // The receiver may already be gone on teardown.
                        let _ = notices.send(Notice::save_failed(&err));
                        let _ = state_tx.send(SaveState::Failed);
                    }
                }
            }
        });

        Self { tx, state_rx }
    }

    /// Queue a snapshot for writing. Fire-and-forget.
    pub(crate) fn enqueue(&self, snapshot: ChecklistSnapshot) {
        if self.tx.send(snapshot).is_err() {
            warn!("save queue closed; dropping snapshot");
        }
    }

    /// Current save state.
    pub(crate) fn state(&self) -> SaveState {
        *self.state_rx.borrow()
    }

    /// Subscribe to save-state transitions.
    pub(crate) fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_board;
    use crate::store::MemoryStore;
    use std::time::Duration;

    async fn wait_for<F>(rx: &mut watch::Receiver<SaveState>, pred: F) -> SaveState
    where
        F: Fn(SaveState) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let state = *rx.borrow();
                if pred(state) {
                    return state;
                }
                rx.changed().await.expect("save task ended early");
            }
        })
        .await
        .expect("save state never settled")
    }

    #[tokio::test]
    async fn test_save_reaches_store_and_reports_saved() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let (notice_tx, _notice_rx) = mpsc::unbounded_channel();
        let queue = SaveQueue::spawn("proj_1".to_string(), Arc::clone(&store), notice_tx);

        assert_eq!(queue.state(), SaveState::Idle);
        queue.enqueue(ChecklistSnapshot {
            sections: default_board(),
            revision: 1,
        });

        let mut rx = queue.subscribe();
        let state = wait_for(&mut rx, |s| matches!(s, SaveState::Saved { .. })).await;
        assert_eq!(state, SaveState::Saved { revision: 1 });

        let record = store.lock().await.fetch("proj_1").unwrap().unwrap();
        assert_eq!(record.revision, 1);
    }

    #[tokio::test]
    async fn test_burst_coalesces_to_newest_revision() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let (notice_tx, _notice_rx) = mpsc::unbounded_channel();
        let queue = SaveQueue::spawn("proj_1".to_string(), Arc::clone(&store), notice_tx);

        for revision in 1..=10 {
            queue.enqueue(ChecklistSnapshot {
                sections: default_board(),
                revision,
            });
        }

        let mut rx = queue.subscribe();
        let state = wait_for(&mut rx, |s| s == SaveState::Saved { revision: 10 }).await;
        assert_eq!(state, SaveState::Saved { revision: 10 });

        let record = store.lock().await.fetch("proj_1").unwrap().unwrap();
        assert_eq!(record.revision, 10);
    }

    #[tokio::test]
    async fn test_stale_snapshot_reports_conflict_not_saved() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        store
            .lock()
            .await
            .upsert(
                "proj_1",
                &ChecklistSnapshot {
                    sections: default_board(),
                    revision: 5,
                },
            )
            .unwrap();

        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let queue = SaveQueue::spawn("proj_1".to_string(), Arc::clone(&store), notice_tx);

        queue.enqueue(ChecklistSnapshot {
            sections: default_board(),
            revision: 1,
        });

        let mut rx = queue.subscribe();
        let state = wait_for(&mut rx, |s| matches!(s, SaveState::Conflict { .. })).await;
        assert_eq!(state, SaveState::Conflict { stored_revision: 5 });

        let notice = notice_rx.recv().await.unwrap();
        assert!(notice.message.contains("could not be saved"));

        // The newer stored row is untouched.
        let record = store.lock().await.fetch("proj_1").unwrap().unwrap();
        assert_eq!(record.revision, 5);
    }

    #[tokio::test]
    async fn test_failed_save_notifies_and_keeps_queue_alive() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        store.lock().await.fail_writes(true);
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let queue = SaveQueue::spawn("proj_1".to_string(), Arc::clone(&store), notice_tx);

        queue.enqueue(ChecklistSnapshot {
            sections: default_board(),
            revision: 1,
        });

        let mut rx = queue.subscribe();
        let state = wait_for(&mut rx, |s| s == SaveState::Failed).await;
        assert_eq!(state, SaveState::Failed);

        let notice = notice_rx.recv().await.unwrap();
        assert!(!notice.is_policy());
        assert!(notice.message.contains("could not be saved"));

        // A later save still goes through once the store recovers.
        store.lock().await.fail_writes(false);
        queue.enqueue(ChecklistSnapshot {
            sections: default_board(),
            revision: 2,
        });
        let state = wait_for(&mut rx, |s| matches!(s, SaveState::Saved { .. })).await;
        assert_eq!(state, SaveState::Saved { revision: 2 });
    }
}
