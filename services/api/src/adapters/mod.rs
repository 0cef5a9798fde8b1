pub mod demo_auth;
pub mod file_store;
pub mod memory_store;
pub mod sqlite_store;

pub use demo_auth::DemoAuthProvider;
pub use file_store::JsonFileSnapshotStore;
pub use memory_store::InMemorySnapshotStore;
pub use sqlite_store::SqliteSnapshotStore;
