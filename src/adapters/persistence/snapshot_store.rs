//! Snapshot Store - Atomic JSON Snapshot Persistence
//!
//! Saves the latest snapshot item to `snapshots/<PK>__<SK>.json` using
//! atomic writes (write to tmp file, then rename). A reader always sees
//! either the previous snapshot or the new one, never a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, instrument};

use crate::ports::snapshot_store::{SnapshotItem, SnapshotStore};

/// File-backed store keyed by partition and sort key.
pub struct JsonSnapshotStore {
    /// Directory holding one file per (PK, SK).
    dir: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a new store in the given data directory.
    ///
    /// Creates `<data_dir>/snapshots` if it doesn't exist.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("snapshots");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create snapshot directory")?;

        Ok(Self { dir })
    }

    /// File path for a key pair. Key characters outside `[A-Za-z0-9-_]`
    /// become `_`.
    pub fn path_for(&self, partition_key: &str, sort_key: &str) -> PathBuf {
        self.dir
            .join(format!("{}__{}.json", file_safe(partition_key), file_safe(sort_key)))
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    #[instrument(skip(self, item), fields(pk = %item.partition_key, sk = %item.sort_key))]
    async fn put_latest(&self, item: &SnapshotItem) -> Result<()> {
        let path = self.path_for(&item.partition_key, &item.sort_key);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(item)
            .context("Failed to serialize snapshot item")?;

        // Write to tmp file
        fs::write(&tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;

        // Atomic rename
        fs::rename(&tmp_path, &path)
            .await
            .context("Failed to rename snapshot file")?;

        info!(
            path = %path.display(),
            records = item.count,
            timestamp = %item.timestamp,
            "Snapshot saved"
        );

        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_latest(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<SnapshotItem>> {
        let path = self.path_for(partition_key, sort_key);
        if !path.exists() {
            info!("No snapshot file found");
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context("Failed to read snapshot file")?;

        let item: SnapshotItem =
            serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;

        Ok(Some(item))
    }

    async fn is_healthy(&self) -> bool {
        let test_path = self.dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}

fn file_safe(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
