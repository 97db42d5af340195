//! Error taxonomy for the reconciliation core.
//!
//! Only two families surface as `Err` values:
//! - `ReconcileError`: the input handed to the core is not a record
//!   collection (fatal to the call, reported as a configuration error)
//! - `FeedError`: one upstream could not be fetched or decoded
//!   (recoverable, the run continues on the surviving feed)
//!
//! Missing fields and records without a symbol are not errors at all:
//! they collapse to zero values and dropped-record counts.

use thiserror::Error;

/// Fatal input errors raised by payload extraction and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Payload or record collection does not have the expected shape.
    #[error("malformed input from feed '{feed}': {reason}")]
    MalformedInput { feed: String, reason: String },

    /// A normalized record carries an empty symbol.
    #[error("record with empty symbol in feed '{feed}'")]
    EmptySymbol { feed: String },

    /// A normalized map is keyed by a symbol other than the record's own.
    #[error("feed '{feed}' keys record '{symbol}' under '{key}'")]
    KeyMismatch {
        feed: String,
        key: String,
        symbol: String,
    },
}

impl ReconcileError {
    pub(crate) fn malformed(feed: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            feed: feed.to_string(),
            reason: reason.into(),
        }
    }
}

/// Upstream acquisition failures. Every variant is recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Transport failure, timeout, or unreadable fixture.
    #[error("feed '{feed}' unavailable: {reason}")]
    Unavailable { feed: String, reason: String },

    /// Upstream answered with a non-success status.
    #[error("feed '{feed}' returned HTTP {status}")]
    Http { feed: String, status: u16 },

    /// Response body was not valid JSON.
    #[error("feed '{feed}' returned undecodable payload: {reason}")]
    Decode { feed: String, reason: String },
}

impl FeedError {
    /// Name of the feed that failed.
    pub fn feed(&self) -> &str {
        match self {
            Self::Unavailable { feed, .. }
            | Self::Http { feed, .. }
            | Self::Decode { feed, .. } => feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_reports_feed_name() {
        let err = FeedError::Http {
            feed: "oi-spurts".to_string(),
            status: 401,
        };
        assert_eq!(err.feed(), "oi-spurts");
        assert_eq!(err.to_string(), "feed 'oi-spurts' returned HTTP 401");
    }

    #[test]
    fn test_malformed_message_names_feed() {
        let err = ReconcileError::malformed("stock-futures", "payload root is a string");
        assert!(err.to_string().contains("stock-futures"));
        assert!(err.to_string().contains("payload root is a string"));
    }
}
