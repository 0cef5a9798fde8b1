//! services/api/src/adapters/memory_store.rs
//!
//! A process-local snapshot repository. Backs the `memory` storage backend and
//! lets tests force write failures.

use async_trait::async_trait;
use campus_core::domain::Snapshot;
use campus_core::ports::{PortError, PortResult, SnapshotRepository};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    saved: Mutex<Option<Snapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// While set, every `save` fails with `PortError::Storage`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Option<Snapshot> {
        self.saved.lock().await.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotStore {
    async fn load(&self) -> PortResult<Option<Snapshot>> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("simulated write failure".to_string()));
        }
        *self.saved.lock().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
