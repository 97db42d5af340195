//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the job's workflow.
//!
//! Use cases:
//! - `SnapshotJob`: gate, fetch both feeds, normalize, reconcile, persist

pub mod snapshot_job;

pub use snapshot_job::{FeedBinding, FeedReport, JobSettings, RunOutcome, RunReport, SnapshotJob};
