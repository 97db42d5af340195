//! File Feed - JSON Payload from Disk
//!
//! Serves a saved upstream response as if it had just been fetched.
//! Used for fixtures, offline replays and reprocessing a capture.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::error::FeedError;
use crate::ports::feed_source::FeedSource;

/// Feed backed by a JSON file.
pub struct FileFeed {
    /// Feed name for logs and errors.
    name: String,
    /// Path to the payload file.
    path: PathBuf,
}

impl FileFeed {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    fn name(&self) -> String {
        self.name.clone()
    }

    #[instrument(skip(self), fields(feed = %self.name, path = %self.path.display()))]
    async fn fetch(&self) -> Result<Value, FeedError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::Unavailable {
                feed: self.name.clone(),
                reason: format!("cannot read {}: {e}", self.path.display()),
            })?;

        let payload = serde_json::from_str(&content).map_err(|e| FeedError::Decode {
            feed: self.name.clone(),
            reason: e.to_string(),
        })?;

        info!(bytes = content.len(), "Feed payload loaded from file");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oi.json");
        std::fs::write(&path, r#"{"data":[{"symbol":"TCS"}]}"#).unwrap();

        let feed = FileFeed::new("oi", &path);
        let payload = feed.fetch().await.unwrap();
        assert_eq!(payload["data"][0]["symbol"], "TCS");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let feed = FileFeed::new("oi", "/nonexistent/oi.json");
        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "<html>Access Denied</html>").unwrap();

        let err = FileFeed::new("price", &path).fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Decode { .. }));
    }

    #[test]
    fn test_unavailable_error_carries_feed_name() {
        let feed = FileFeed::new("price", "/nonexistent/price.json");
        let err = tokio_test::block_on(feed.fetch()).unwrap_err();
        assert_eq!(err.feed(), "price");
    }
}
