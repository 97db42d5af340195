//! Reconciler - union merge of the two normalized feeds.
//!
//! Feed A (open interest) seeds the result. Feed B (price) adds the
//! symbols A never saw and, for shared symbols, overlays `last_price`
//! only. B's open-interest fields are often stale zeros and must never
//! replace A's.

use std::collections::btree_map::Entry;

use serde::Serialize;

use super::error::ReconcileError;
use super::record::{CanonicalRecord, Provenance, RecordMap};

/// Count of final records per provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceSummary {
    pub feed_a_only: usize,
    pub feed_b_only: usize,
    pub merged: usize,
}

impl ProvenanceSummary {
    pub fn total(&self) -> usize {
        self.feed_a_only + self.feed_b_only + self.merged
    }

    /// Count for a single provenance tag.
    pub fn count(&self, provenance: Provenance) -> usize {
        match provenance {
            Provenance::FeedAOnly => self.feed_a_only,
            Provenance::FeedBOnly => self.feed_b_only,
            Provenance::Merged => self.merged,
        }
    }
}

/// Final per-symbol collection produced by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledSet {
    records: RecordMap,
}

impl ReconciledSet {
    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    pub fn get(&self, symbol: &str) -> Option<&CanonicalRecord> {
        self.records.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by symbol.
    pub fn to_vec(&self) -> Vec<CanonicalRecord> {
        self.records.values().cloned().collect()
    }

    pub fn summary(&self) -> ProvenanceSummary {
        self.records
            .values()
            .fold(ProvenanceSummary::default(), |mut acc, record| {
                match record.provenance {
                    Provenance::FeedAOnly => acc.feed_a_only += 1,
                    Provenance::FeedBOnly => acc.feed_b_only += 1,
                    Provenance::Merged => acc.merged += 1,
                }
                acc
            })
    }
}

/// Merge the open-interest feed (`oi`) with the price feed (`price`).
///
/// The result's key set is the union of both inputs. For symbols in
/// both, open-interest fields come from `oi` unchanged and `last_price`
/// comes from `price` when non-zero.
///
/// # Errors
/// `ReconcileError` when either map holds an empty symbol or keys a
/// record under a symbol other than its own.
pub fn reconcile(oi: &RecordMap, price: &RecordMap) -> Result<ReconciledSet, ReconcileError> {
    let mut records = RecordMap::new();

    for (key, record) in oi {
        check_entry("open_interest", key, record)?;
        records.insert(
            key.clone(),
            CanonicalRecord {
                provenance: Provenance::FeedAOnly,
                ..record.clone()
            },
        );
    }

    for (key, record) in price {
        check_entry("price", key, record)?;
        match records.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(CanonicalRecord {
                    provenance: Provenance::FeedBOnly,
                    ..record.clone()
                });
            }
            Entry::Occupied(mut slot) => slot.get_mut().overlay_price(record),
        }
    }

    Ok(ReconciledSet { records })
}

fn check_entry(feed: &str, key: &str, record: &CanonicalRecord) -> Result<(), ReconcileError> {
    if key.trim().is_empty() || record.symbol.trim().is_empty() {
        return Err(ReconcileError::EmptySymbol {
            feed: feed.to_string(),
        });
    }
    if key != record.symbol {
        return Err(ReconcileError::KeyMismatch {
            feed: feed.to_string(),
            key: key.to_string(),
            symbol: record.symbol.clone(),
        });
    }
    Ok(())
}
