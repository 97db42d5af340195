//! Snapshot Store Port - Latest Snapshot Persistence
//!
//! The reconciled collection is stored as one logical item keyed by a
//! constant partition key and a constant "latest" sort key. The record
//! list travels as a JSON string next to an ISO-8601 capture time.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::record::CanonicalRecord;

/// Persisted representation of one run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
  /// Partition key (e.g. `NSE#OI`).
  #[serde(rename = "PK")]
  pub partition_key: String,
  /// Sort key (e.g. `LATEST`).
  #[serde(rename = "SK")]
  pub sort_key: String,
  /// JSON-serialized list of canonical records.
  pub data: String,
  /// Capture time, RFC 3339 in UTC.
  pub timestamp: String,
  /// Run that produced this item.
  pub run_id: Uuid,
  /// Number of records in `data`.
  pub count: usize,
}

impl SnapshotItem {
  /// Build an item from the final records of a run.
  ///
  /// # Errors
  /// Fails only if a record cannot be serialized.
  pub fn new(
    partition_key: &str,
    sort_key: &str,
    records: &[CanonicalRecord],
    captured_at: DateTime<Utc>,
    run_id: Uuid,
  ) -> serde_json::Result<Self> {
    Ok(Self {
      partition_key: partition_key.to_string(),
      sort_key: sort_key.to_string(),
      data: serde_json::to_string(records)?,
      timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
      run_id,
      count: records.len(),
    })
  }

  /// Decode the record list carried in `data`.
  pub fn records(&self) -> serde_json::Result<Vec<CanonicalRecord>> {
    serde_json::from_str(&self.data)
  }
}

/// Trait for snapshot persistence providers.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
  /// Write `item`, replacing any item with the same keys.
  async fn put_latest(&self, item: &SnapshotItem) -> anyhow::Result<()>;

  /// Read the item stored under the given keys, if any.
  async fn load_latest(
    &self,
    partition_key: &str,
    sort_key: &str,
  ) -> anyhow::Result<Option<SnapshotItem>>;

  /// Check if the store is writable.
  async fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::record::Provenance;
  use chrono::TimeZone;

  #[test]
  fn test_item_wire_shape() {
    let records = vec![CanonicalRecord::empty("TCS", Provenance::Merged)];
    let at = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
    let item = SnapshotItem::new("NSE#OI", "LATEST", &records, at, Uuid::nil()).unwrap();

    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["PK"], "NSE#OI");
    assert_eq!(value["SK"], "LATEST");
    assert_eq!(value["timestamp"], "2026-10-16T10:00:00.000Z");
    assert_eq!(item.count, 1);
    assert_eq!(item.records().unwrap(), records);
  }
}
