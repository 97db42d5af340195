//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the reconciliation job requires
//! from the outside world. Adapters implement these traits, tests
//! substitute fixtures and mocks.
//!
//! Port categories:
//! - `FeedSource`: one best-effort fetch of an upstream payload
//! - `SnapshotStore`: durable write of the latest reconciled snapshot

pub mod feed_source;
pub mod snapshot_store;
