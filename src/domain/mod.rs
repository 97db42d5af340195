//! Domain layer - the reconciliation core.
//!
//! Pure, synchronous transformations over already-fetched payloads:
//! alias-driven field resolution, per-feed normalization, and the
//! two-feed merge. No I/O happens here.

pub mod aliases;
pub mod calendar;
pub mod error;
pub mod normalizer;
pub mod reconciler;
pub mod record;
pub mod resolver;

// Re-export core types for convenience
pub use aliases::{AliasOverrides, AliasTable, CanonicalField};
pub use calendar::{ClosedReason, TradingCalendar};
pub use error::{FeedError, ReconcileError};
pub use normalizer::{NormalizedBatch, SourceNormalizer};
pub use reconciler::{ProvenanceSummary, ReconciledSet, reconcile};
pub use record::{
    CanonicalRecord, FeedSide, Provenance, RawRecord, RecordMap, Symbol, records_from_payload,
};
