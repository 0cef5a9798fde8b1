//! services/api/src/adapters/file_store.rs
//!
//! Keeps the store snapshot as a single JSON document on local disk, the same
//! shape the mobile client writes to its key/value storage.

use async_trait::async_trait;
use campus_core::domain::Snapshot;
use campus_core::ports::{PortError, PortResult, SnapshotRepository};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// A snapshot repository backed by `<dir>/<storage key>.json`.
#[derive(Clone, Debug)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>, storage_key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{storage_key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(path: &Path, action: &str, err: std::io::Error) -> PortError {
    PortError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

#[async_trait]
impl SnapshotRepository for JsonFileSnapshotStore {
    async fn load(&self) -> PortResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(storage_error(&self.path, "read", e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PortError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    /// Writes to a sibling temp file first and renames it into place, so a
    /// crash mid-write never leaves a truncated snapshot behind.
    async fn save(&self, snapshot: &Snapshot) -> PortResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error(dir, "create", e))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PortError::Unexpected(format!("failed to encode snapshot: {e}")))?;

        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, &json)
            .await
            .map_err(|e| storage_error(&tmp, "write", e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(storage_error(&self.path, "replace", e));
        }
        Ok(())
    }
}
