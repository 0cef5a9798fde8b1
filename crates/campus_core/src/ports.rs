//! crates/campus_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of storage backends, the system clock and the login flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::{Location, Snapshot, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external collaborators (files, sqlite, auth).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Stored snapshot is unreadable: {0}")]
    Corrupt(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Synchronous Collaborators
//=========================================================================================

/// Source of the current time, injectable so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Produces identifiers that are unique for the lifetime of the process.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Receives a full snapshot after every state change.
///
/// Implementations must not block: the store calls this while the mutation is
/// still in progress and expects the durable write to happen elsewhere.
pub trait SnapshotSink: Send + Sync {
    fn enqueue(&self, revision: u64, snapshot: Snapshot);
}

/// Read-only access to the campus location catalogue.
pub trait LocationDirectory: Send + Sync {
    fn get_location_by_id(&self, id: &str) -> Option<Location>;

    /// Case-insensitive substring match over name, description, building and room number.
    fn search_locations(&self, query: &str) -> Vec<Location>;

    fn all_locations(&self) -> Vec<Location>;
}

//=========================================================================================
// Asynchronous Service Ports
//=========================================================================================

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Returns the last durable snapshot, or `None` when nothing was ever saved.
    async fn load(&self) -> PortResult<Option<Snapshot>>;

    async fn save(&self, snapshot: &Snapshot) -> PortResult<()>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves credentials to a user profile. The store stamps `last_login` itself.
    async fn authenticate(&self, roll_number: &str, password: &str) -> PortResult<User>;
}
