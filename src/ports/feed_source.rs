//! Feed Source Port - Upstream Payload Acquisition
//!
//! A feed hands back the decoded JSON body of a single fetch. Shape
//! checks and normalization happen in the domain, so an implementation
//! may be an HTTP session, a file on disk, or a test fixture.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::FeedError;

/// Trait for upstream market-data feeds.
///
/// Implementors perform exactly one attempt per call. Failures are
/// reported as `FeedError` and treated by the caller as "this feed has
/// no data for this run".
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
  /// Feed name used in logs, metrics and errors.
  fn name(&self) -> String;

  /// Fetch and decode the current payload.
  async fn fetch(&self) -> Result<Value, FeedError>;
}
