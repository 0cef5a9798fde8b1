//! services/api/src/service.rs
//!
//! Owns the application store for the lifetime of the server. All mutations go
//! through one async mutex, every committed change is handed to the snapshot
//! writer and fanned out to live subscribers.

use campus_core::ports::{Clock, IdGenerator, PortError, PortResult, SnapshotRepository};
use campus_core::store::{AppStore, StoreEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::persistence::{SnapshotWriter, WriteStatus};

/// How many store events a slow subscriber may fall behind before it starts
/// missing them.
const EVENT_BUFFER: usize = 64;

pub struct StoreService {
    store: Mutex<AppStore>,
    writer: Arc<SnapshotWriter>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreService {
    /// Loads the last snapshot from `repository` and starts the writer task.
    ///
    /// An unreadable snapshot is logged and replaced by an empty store; any
    /// other load failure is returned. The returned handle finishes once
    /// `shutdown` is cancelled and the final snapshot is flushed.
    pub async fn start(
        repository: Arc<dyn SnapshotRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        shutdown: CancellationToken,
    ) -> PortResult<(Self, JoinHandle<()>)> {
        let mut store =
            match AppStore::hydrate(repository.as_ref(), clock.clone(), ids.clone()).await {
                Ok(store) => store,
                Err(PortError::Corrupt(reason)) => {
                    warn!(%reason, "Stored snapshot is unreadable, starting with an empty store");
                    AppStore::new(clock.clone(), ids)
                }
                Err(e) => return Err(e),
            };
        info!(
            authenticated = store.is_authenticated(),
            bookmarks = store.bookmarks().len(),
            classes = store.class_schedule().len(),
            "Store hydrated"
        );

        let (writer, handle) = SnapshotWriter::spawn(repository, clock, shutdown);
        let writer = Arc::new(writer);

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let forward = events.clone();
        store.subscribe(Box::new(move |event: &StoreEvent| {
            // No receivers is the normal state when nobody is watching.
            let _ = forward.send(event.clone());
        }));
        let store = store.with_sink(writer.clone());

        Ok((
            Self {
                store: Mutex::new(store),
                writer,
                events,
            },
            handle,
        ))
    }

    /// Runs `f` with shared access to the store.
    pub async fn read<R>(&self, f: impl FnOnce(&AppStore) -> R) -> R {
        let store = self.store.lock().await;
        f(&store)
    }

    /// Runs `f` with exclusive access to the store. Mutations made inside are
    /// atomic with respect to every other caller.
    pub async fn with_store<R>(&self, f: impl FnOnce(&mut AppStore) -> R) -> R {
        let mut store = self.store.lock().await;
        f(&mut store)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn writer(&self) -> &SnapshotWriter {
        &self.writer
    }

    pub fn write_status(&self) -> WriteStatus {
        self.writer.status()
    }

    pub fn retry_failed_write(&self) -> bool {
        self.writer.retry_failed()
    }
}
