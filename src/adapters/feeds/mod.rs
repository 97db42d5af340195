//! Feed Adapters - Upstream Payload Acquisition
//!
//! Provides `FeedSource` implementations for:
//! - HTTP: exchange REST endpoints behind a cookie session
//! - File: saved payloads for fixtures and replays

pub mod file;
pub mod http;

use std::sync::Arc;

use anyhow::Result;

pub use file::FileFeed;
pub use http::{HttpFeed, HttpFeedConfig};

use crate::config::{FeedConfig, FeedKind};
use crate::ports::feed_source::FeedSource;

/// Build the adapter a feed config asks for.
pub fn build_feed(config: &FeedConfig) -> Result<Arc<dyn FeedSource>> {
    let feed: Arc<dyn FeedSource> = match config.kind {
        FeedKind::Http => Arc::new(HttpFeed::new(HttpFeedConfig::from_feed_config(config)?)?),
        FeedKind::File => Arc::new(FileFeed::new(config.name.clone(), config.url.clone())),
    };
    Ok(feed)
}
