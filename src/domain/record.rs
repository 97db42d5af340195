//! Record types shared by every stage of the pipeline.
//!
//! `RawRecord` is whatever one upstream delivers for one instrument.
//! `CanonicalRecord` is the fixed schema the rest of the system speaks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ReconcileError;

/// Instrument identifier, the primary key of every collection.
pub type Symbol = String;

/// One upstream record: field name to heterogeneous JSON value.
pub type RawRecord = serde_json::Map<String, Value>;

/// Canonical records keyed by symbol, ordered for deterministic output.
pub type RecordMap = BTreeMap<Symbol, CanonicalRecord>;

/// Which role a feed plays in reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSide {
    /// Feed A: sparse but authoritative for open interest.
    OpenInterest,
    /// Feed B: broad, authoritative for price, stale for open interest.
    Price,
}

impl FeedSide {
    /// Provenance carried by a record that only this feed answered.
    pub fn sole_provenance(self) -> Provenance {
        match self {
            Self::OpenInterest => Provenance::FeedAOnly,
            Self::Price => Provenance::FeedBOnly,
        }
    }
}

impl fmt::Display for FeedSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenInterest => write!(f, "open_interest"),
            Self::Price => write!(f, "price"),
        }
    }
}

/// Which feed(s) contributed to a final record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "FEED_A_ONLY")]
    FeedAOnly,
    #[serde(rename = "FEED_B_ONLY")]
    FeedBOnly,
    #[serde(rename = "MERGED")]
    Merged,
}

impl Provenance {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeedAOnly => "FEED_A_ONLY",
            Self::FeedBOnly => "FEED_B_ONLY",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized per-instrument record.
///
/// Unknown numeric fields are `0.0`. `percent_change_in_open_interest`
/// is always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub symbol: Symbol,
    pub last_price: f64,
    pub open_interest: f64,
    pub change_in_open_interest: f64,
    pub percent_change_in_open_interest: f64,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    /// Zero-valued record for a symbol.
    pub fn empty(symbol: impl Into<Symbol>, provenance: Provenance) -> Self {
        Self {
            symbol: symbol.into(),
            last_price: 0.0,
            open_interest: 0.0,
            change_in_open_interest: 0.0,
            percent_change_in_open_interest: 0.0,
            provenance,
        }
    }

    /// Overlay the price-feed view of the same instrument.
    ///
    /// Only `last_price` is taken, and only when non-zero. Open-interest
    /// fields are never touched.
    pub fn overlay_price(&mut self, price_side: &Self) {
        if price_side.last_price != 0.0 {
            self.last_price = price_side.last_price;
        }
        self.provenance = Provenance::Merged;
    }
}

/// Pull the record array out of a decoded upstream payload.
///
/// `pointer` is an RFC 6901 JSON pointer (`""` addresses the root).
///
/// - `Ok(None)`: the payload carries no record collection at all (nothing
///   at the pointer, or an empty object there). NSE answers `{}` when it
///   rejects the session cookie; the feed counts as unavailable.
/// - `Ok(Some(vec![]))`: `null` payload, or `null` at the pointer.
/// - `Err(MalformedInput)`: a non-array value, or a non-object element.
pub fn records_from_payload(
    feed: &str,
    payload: &Value,
    pointer: &str,
) -> Result<Option<Vec<RawRecord>>, ReconcileError> {
    if payload.is_null() {
        return Ok(Some(Vec::new()));
    }

    let Some(target) = payload.pointer(pointer) else {
        return Ok(None);
    };

    match target {
        Value::Null => Ok(Some(Vec::new())),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(ReconcileError::malformed(
                    feed,
                    format!("element {i} is {}, expected an object", json_kind(other)),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(ReconcileError::malformed(
            feed,
            format!("value at '{pointer}' is {}, expected an array", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
