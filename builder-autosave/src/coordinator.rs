//! Debounced autosave.
//!
//! The coordinator owns a background task holding at most one pending
//! snapshot. Every [`AutosaveCoordinator::mark_dirty`] replaces the pending
//! snapshot and restarts the quiet period; the save happens once the period
//! elapses without another mark. A failed save keeps its snapshot but stays
//! disarmed until the next mark (or an explicit flush), so a broken backend
//! is never hammered.
//!
//! ```text
//! mark_dirty ──► [pending + deadline] ──quiet period──► DocumentStore::save
//!      ▲                                                       │
//!      └──────────── retry on next mark ◄──── failure ◄────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use builder_core::{DocumentSnapshot, EditorEvent, EditorSession};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::PersistenceResult;
use crate::store::{DocumentStore, SaveReceipt};

/// Default quiet period before a dirty document is saved.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 32;

/// Autosave configuration.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// How long edits must pause before a save starts.
    pub quiet_period: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Observable state of the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveStatus {
    /// A snapshot is waiting to be saved.
    pub dirty: bool,
    /// Time of the last successful save.
    pub last_saved: Option<DateTime<Utc>>,
    /// Failed saves since the last success.
    pub consecutive_failures: u32,
}

/// Outcome notifications for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveEvent {
    /// A snapshot was persisted.
    Saved(SaveReceipt),
    /// A save failed. The snapshot is retried on the next dirty mark.
    Failed {
        /// Error text.
        message: String,
        /// Failed saves since the last success.
        consecutive_failures: u32,
    },
}

impl AutosaveEvent {
    /// Passive notification text for the editor.
    #[must_use]
    pub fn notification(&self) -> EditorEvent {
        match self {
            Self::Saved(_) => EditorEvent::success("Draft saved"),
            Self::Failed { .. } => EditorEvent::error("Couldn't save draft"),
        }
    }
}

type FlushReply = oneshot::Sender<PersistenceResult<Option<SaveReceipt>>>;

enum Message {
    Dirty(Box<DocumentSnapshot>),
    Flush(FlushReply),
    Cancel,
}

/// Handle to a running autosave task.
///
/// Call [`shutdown`](Self::shutdown) to stop it: that awaits the final save
/// and returns its outcome.
///
/// Dropping the handle only closes the task's inbox. The detached task still
/// tries to save whatever is pending, but nothing waits for it, so the save is
/// lost if the runtime shuts down first. A failure is only reported through
/// [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct AutosaveCoordinator {
    tx: mpsc::UnboundedSender<Message>,
    status: watch::Receiver<AutosaveStatus>,
    events: broadcast::Sender<AutosaveEvent>,
    task: JoinHandle<()>,
}

impl AutosaveCoordinator {
    /// Start the autosave task for one document.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        document_id: impl Into<String>,
        config: AutosaveConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(AutosaveStatus::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let worker = Worker {
            store,
            document_id: document_id.into(),
            quiet_period: config.quiet_period,
            status: status_tx,
            events: events.clone(),
            pending: None,
        };
        debug!(
            "Autosave started for {} (quiet period {:?})",
            worker.document_id, worker.quiet_period
        );
        let task = tokio::spawn(worker.run(rx));

        Self {
            tx,
            status,
            events,
            task,
        }
    }

    /// Record a new snapshot and restart the quiet period.
    pub fn mark_dirty(&self, snapshot: DocumentSnapshot) {
        if self.tx.send(Message::Dirty(Box::new(snapshot))).is_err() {
            warn!("Autosave task has stopped; dropping dirty snapshot");
        }
    }

    /// Mark dirty if any of the events changed document content.
    ///
    /// Returns `true` if a snapshot was queued.
    pub fn track(&self, session: &EditorSession, events: &[EditorEvent]) -> bool {
        if events.iter().any(EditorEvent::is_content_change) {
            self.mark_dirty(session.snapshot());
            true
        } else {
            false
        }
    }

    /// Save the pending snapshot now.
    ///
    /// Returns `Ok(None)` if nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the save fails. The snapshot stays
    /// pending.
    pub async fn flush(&self) -> PersistenceResult<Option<SaveReceipt>> {
        let (reply, outcome) = oneshot::channel();
        if self.tx.send(Message::Flush(reply)).is_err() {
            return Ok(None);
        }
        outcome.await.unwrap_or(Ok(None))
    }

    /// Drop the pending snapshot without saving it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Message::Cancel);
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AutosaveStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<AutosaveStatus> {
        self.status.clone()
    }

    /// Subscribe to save outcomes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.events.subscribe()
    }

    /// Flush, stop the task and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the final save fails.
    pub async fn shutdown(self) -> PersistenceResult<Option<SaveReceipt>> {
        let outcome = self.flush().await;
        if outcome.is_err() {
            // Already reported; do not try again on the way out.
            self.cancel();
        }
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!("Autosave task ended abnormally: {e}");
        }
        outcome
    }
}

struct Worker {
    store: Arc<dyn DocumentStore>,
    document_id: String,
    quiet_period: Duration,
    status: watch::Sender<AutosaveStatus>,
    events: broadcast::Sender<AutosaveEvent>,
    pending: Option<DocumentSnapshot>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        let mut deadline: Option<Instant> = None;
        loop {
            let message = match deadline {
                Some(at) => tokio::select! {
                    message = rx.recv() => message,
                    () = tokio::time::sleep_until(at) => {
                        deadline = None;
                        let _ = self.save_pending().await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match message {
                Some(Message::Dirty(snapshot)) => {
                    self.pending = Some(*snapshot);
                    deadline = Some(Instant::now() + self.quiet_period);
                    self.status.send_modify(|s| s.dirty = true);
                }
                Some(Message::Flush(reply)) => {
                    deadline = None;
                    let _ = reply.send(self.save_pending().await);
                }
                Some(Message::Cancel) => {
                    deadline = None;
                    if self.pending.take().is_some() {
                        debug!("Pending autosave for {} cancelled", self.document_id);
                    }
                    self.status.send_modify(|s| s.dirty = false);
                }
                None => {
                    if self.pending.is_some() {
                        let _ = self.save_pending().await;
                    }
                    break;
                }
            }
        }
        debug!("Autosave stopped for {}", self.document_id);
    }

    async fn save_pending(&mut self) -> PersistenceResult<Option<SaveReceipt>> {
        let Some(snapshot) = self.pending.take() else {
            return Ok(None);
        };

        match self.store.save(&self.document_id, &snapshot).await {
            Ok(receipt) => {
                info!(
                    "Autosaved {} ({} elements)",
                    self.document_id,
                    snapshot.elements.len()
                );
                self.status.send_modify(|s| {
                    s.dirty = false;
                    s.last_saved = Some(receipt.saved_at);
                    s.consecutive_failures = 0;
                });
                let _ = self.events.send(AutosaveEvent::Saved(receipt.clone()));
                Ok(Some(receipt))
            }
            Err(e) => {
                self.pending = Some(snapshot);
                let mut failures = 0;
                self.status.send_modify(|s| {
                    s.consecutive_failures += 1;
                    failures = s.consecutive_failures;
                });
                warn!(
                    "Autosave of {} failed ({} in a row): {}",
                    self.document_id, failures, e
                );
                let _ = self.events.send(AutosaveEvent::Failed {
                    message: e.to_string(),
                    consecutive_failures: failures,
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use builder_core::NotificationLevel;

    #[test]
    fn test_default_config() {
        assert_eq!(AutosaveConfig::default().quiet_period, Duration::from_secs(5));
    }

    #[test]
    fn test_event_notifications_are_passive() {
        let saved = AutosaveEvent::Saved(SaveReceipt::now("doc"));
        assert!(matches!(
            saved.notification(),
            EditorEvent::Notification { level: NotificationLevel::Success, .. }
        ));

        let failed = AutosaveEvent::Failed {
            message: "offline".into(),
            consecutive_failures: 2,
        };
        assert!(matches!(
            failed.notification(),
            EditorEvent::Notification { level: NotificationLevel::Error, .. }
        ));
    }
}
