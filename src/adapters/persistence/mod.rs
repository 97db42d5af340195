//! Persistence Adapters - JSON File Storage
//!
//! Implements the SnapshotStore port with one atomically replaced JSON
//! file per (partition key, sort key). No database dependency.

pub mod snapshot_store;

pub use snapshot_store::JsonSnapshotStore;
