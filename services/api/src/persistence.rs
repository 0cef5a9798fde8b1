//! services/api/src/persistence.rs
//!
//! The background snapshot writer. The store hands over a full snapshot after
//! every change without waiting; this task writes them to the configured
//! repository one at a time, always skipping ahead to the newest queued
//! snapshot.

use campus_core::domain::Snapshot;
use campus_core::ports::{Clock, SnapshotRepository, SnapshotSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Status Reporting
//=========================================================================================

/// Outcome of the most recent durable write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WriteStatus {
    /// Nothing has been written since startup.
    Idle,
    Saved { revision: u64, at: DateTime<Utc> },
    /// The snapshot for `revision` could not be written. It is kept for a retry
    /// until a newer snapshot is written successfully.
    Failed { revision: u64, error: String },
}

impl WriteStatus {
    pub fn revision(&self) -> Option<u64> {
        match self {
            WriteStatus::Idle => None,
            WriteStatus::Saved { revision, .. } | WriteStatus::Failed { revision, .. } => {
                Some(*revision)
            }
        }
    }
}

//=========================================================================================
// Writer Handle
//=========================================================================================

struct PendingWrite {
    revision: u64,
    snapshot: Snapshot,
}

enum Command {
    Write(PendingWrite),
    RetryFailed,
}

/// Handle to the writer task. Implements `SnapshotSink` so it can be attached
/// to an `AppStore` directly.
pub struct SnapshotWriter {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<WriteStatus>,
}

impl SnapshotWriter {
    /// Spawns the writer task. It runs until `shutdown` is cancelled, then
    /// writes whatever is still queued and exits.
    pub fn spawn(
        repository: Arc<dyn SnapshotRepository>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(WriteStatus::Idle);

        let task = WriterTask {
            repository,
            clock,
            status: status_tx,
            failed: None,
        };
        let handle = tokio::spawn(task.run(receiver, shutdown));

        (Self { commands, status }, handle)
    }

    pub fn status(&self) -> WriteStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<WriteStatus> {
        self.status.clone()
    }

    /// Asks the writer to try the last failed snapshot again. Returns `false`
    /// when there is nothing to retry.
    pub fn retry_failed(&self) -> bool {
        if !matches!(*self.status.borrow(), WriteStatus::Failed { .. }) {
            return false;
        }
        self.commands.send(Command::RetryFailed).is_ok()
    }

    /// Waits until a write for `revision` (or a later one) has finished,
    /// successfully or not.
    pub async fn wait_for_revision(&self, revision: u64) -> WriteStatus {
        let mut status = self.status.clone();
        let reached = status
            .wait_for(|s| s.revision().is_some_and(|r| r >= revision))
            .await
            .map(|s| s.clone());
        match reached {
            Ok(s) => s,
            // The writer is gone; report the last thing it published.
            Err(_) => self.status(),
        }
    }
}

impl SnapshotSink for SnapshotWriter {
    fn enqueue(&self, revision: u64, snapshot: Snapshot) {
        let write = PendingWrite { revision, snapshot };
        if self.commands.send(Command::Write(write)).is_err() {
            warn!(revision, "Snapshot writer has stopped; change will not be persisted");
        }
    }
}

//=========================================================================================
// Writer Task
//=========================================================================================

struct WriterTask {
    repository: Arc<dyn SnapshotRepository>,
    clock: Arc<dyn Clock>,
    status: watch::Sender<WriteStatus>,
    failed: Option<PendingWrite>,
}

impl WriterTask {
    async fn run(
        mut self,
        mut receiver: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    let next = self.drain(&mut receiver, None);
                    if let Some(write) = next.or_else(|| self.failed.take()) {
                        info!(revision = write.revision, "Flushing snapshot before shutdown");
                        self.persist(write).await;
                    }
                    break;
                }
                command = receiver.recv() => {
                    let Some(command) = command else { break };
                    if let Some(write) = self.drain(&mut receiver, Some(command)) {
                        self.persist(write).await;
                    }
                }
            }
        }
        debug!("Snapshot writer stopped");
    }

    /// Collapses everything queued into the single write that matters: the
    /// newest snapshot, or the failed one when only a retry was requested.
    fn drain(
        &mut self,
        receiver: &mut mpsc::UnboundedReceiver<Command>,
        first: Option<Command>,
    ) -> Option<PendingWrite> {
        let mut newest: Option<PendingWrite> = None;
        let mut retry = false;
        let mut apply = |command: Command| match command {
            Command::Write(write) => newest = Some(write),
            Command::RetryFailed => retry = true,
        };

        if let Some(command) = first {
            apply(command);
        }
        while let Ok(command) = receiver.try_recv() {
            apply(command);
        }

        match newest {
            Some(write) => Some(write),
            None if retry => self.failed.take(),
            None => None,
        }
    }

    async fn persist(&mut self, write: PendingWrite) {
        match self.repository.save(&write.snapshot).await {
            Ok(()) => {
                debug!(revision = write.revision, "Snapshot saved");
                self.failed = None;
                self.status.send_replace(WriteStatus::Saved {
                    revision: write.revision,
                    at: self.clock.now(),
                });
            }
            Err(e) => {
                error!(revision = write.revision, error = %e, "Failed to save snapshot");
                self.status.send_replace(WriteStatus::Failed {
                    revision: write.revision,
                    error: e.to_string(),
                });
                self.failed = Some(write);
            }
        }
    }
}
