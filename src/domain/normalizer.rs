//! Source Normalizer - raw upstream records into the canonical schema.
//!
//! Drives the Field Resolver with one feed's alias table, drops records
//! that carry no usable symbol, and derives the open-interest percentage
//! change when the upstream leaves it out.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use super::aliases::{AliasTable, CanonicalField};
use super::record::{CanonicalRecord, FeedSide, RawRecord, RecordMap};
use super::resolver::{resolve, resolve_present, resolve_symbol};

/// Output of normalizing one feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Canonical records keyed by symbol (last occurrence wins).
    pub records: RecordMap,
    /// Raw records dropped for lack of a symbol.
    pub dropped: usize,
    /// Raw records that overwrote an earlier record of the same symbol.
    pub duplicates: usize,
}

/// Per-feed normalizer.
#[derive(Debug, Clone)]
pub struct SourceNormalizer {
    side: FeedSide,
    aliases: AliasTable,
}

impl SourceNormalizer {
    pub fn new(side: FeedSide, aliases: AliasTable) -> Self {
        Self { side, aliases }
    }

    /// Normalizer with the built-in alias table for `side`.
    pub fn with_default_aliases(side: FeedSide) -> Self {
        Self::new(side, AliasTable::for_side(side))
    }

    pub fn side(&self) -> FeedSide {
        self.side
    }

    /// Normalize a whole feed payload.
    pub fn normalize(&self, raw_records: &[RawRecord]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for raw in raw_records {
            let Some(record) = self.normalize_one(raw) else {
                batch.dropped += 1;
                continue;
            };
            if batch.records.insert(record.symbol.clone(), record).is_some() {
                batch.duplicates += 1;
            }
        }

        batch
    }

    /// Normalize one record; `None` when no symbol resolves.
    pub fn normalize_one(&self, raw: &RawRecord) -> Option<CanonicalRecord> {
        let aliases = &self.aliases;

        let symbol = resolve_symbol(raw, aliases.candidates(CanonicalField::Symbol))?;
        let last_price = resolve(raw, aliases.candidates(CanonicalField::LastPrice));
        let open_interest = resolve(raw, aliases.candidates(CanonicalField::OpenInterest));
        let change = resolve(raw, aliases.candidates(CanonicalField::ChangeInOpenInterest));

        let supplied =
            resolve_present(raw, aliases.candidates(CanonicalField::PercentChangeInOpenInterest));
        let percent = match supplied {
            Some(supplied) => round_2dp(supplied),
            None => {
                let previous =
                    resolve_present(raw, aliases.candidates(CanonicalField::PreviousOpenInterest));
                derive_percent_change(change, previous, open_interest)
            }
        };

        Some(CanonicalRecord {
            symbol,
            last_price,
            open_interest,
            change_in_open_interest: change,
            percent_change_in_open_interest: percent,
            provenance: self.side.sole_provenance(),
        })
    }
}

/// Percentage change in open interest, rounded to 2 decimals.
///
/// Uses `previous` when it is positive; otherwise reconstructs it as
/// `latest - change` when `latest` is positive. Any non-positive
/// denominator yields `0.0`.
pub fn derive_percent_change(change: f64, previous: Option<f64>, latest: f64) -> f64 {
    if let Some(previous) = previous.filter(|p| *p > 0.0) {
        return percent_of(change, previous);
    }
    if latest > 0.0 {
        let previous = latest - change;
        if previous > 0.0 {
            return percent_of(change, previous);
        }
    }
    0.0
}

/// Round half away from zero to 2 decimals; non-finite input gives `0.0`.
pub fn round_2dp(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

fn percent_of(change: f64, base: f64) -> f64 {
    let (Some(change), Some(base)) = (Decimal::from_f64(change), Decimal::from_f64(base)) else {
        return 0.0;
    };
    change
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(|pct| pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|pct| pct.to_f64())
        .filter(|pct| pct.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Provenance;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_derives_previous_from_latest_and_change() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::OpenInterest);
        let rec = n
            .normalize_one(&raw(json!({"symbol": "TCS", "latestOI": 1000, "changeInOI": 100})))
            .unwrap();
        assert_eq!(rec.open_interest, 1000.0);
        assert_eq!(rec.change_in_open_interest, 100.0);
        assert!(approx(rec.percent_change_in_open_interest, 11.11));
        assert_eq!(rec.provenance, Provenance::FeedAOnly);
    }

    #[test]
    fn test_uses_previous_when_positive() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::OpenInterest);
        let rec = n
            .normalize_one(&raw(json!({
                "symbol": "INFY", "latestOI": "1,500", "prevOI": "1,200", "changeInOI": 300
            })))
            .unwrap();
        assert!(approx(rec.percent_change_in_open_interest, 25.0));
    }

    #[test]
    fn test_zero_previous_without_latest_is_zero() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::OpenInterest);
        let rec = n
            .normalize_one(&raw(json!({"symbol": "SBIN", "previousOI": 0, "changeInOI": 50})))
            .unwrap();
        assert_eq!(rec.percent_change_in_open_interest, 0.0);
    }

    #[test]
    fn test_non_positive_reconstructed_previous_is_zero() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::OpenInterest);
        let rec = n
            .normalize_one(&raw(json!({"symbol": "NEW", "latestOI": 400, "changeInOI": 400})))
            .unwrap();
        assert_eq!(rec.percent_change_in_open_interest, 0.0);
    }

    #[test]
    fn test_supplied_percentage_is_kept() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::Price);
        let rec = n
            .normalize_one(&raw(json!({
                "underlying": "RELIANCE",
                "lastPrice": 2950.5,
                "openInterest": 1000,
                "changeinOpenInterest": 100,
                "pchangeinOpenInterest": -3.14159
            })))
            .unwrap();
        assert!(approx(rec.percent_change_in_open_interest, -3.14));
        assert_eq!(rec.last_price, 2950.5);
        assert_eq!(rec.provenance, Provenance::FeedBOnly);
    }

    #[test]
    fn test_negative_change_reduces_open_interest() {
        assert!(approx(derive_percent_change(-250.0, None, 750.0), -25.0));
    }

    #[test]
    fn test_records_without_symbol_are_dropped() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::Price);
        let batch = n.normalize(&[
            raw(json!({"underlying": "TCS", "lastPrice": 3500})),
            raw(json!({"lastPrice": 10})),
            raw(json!({"underlying": ""})),
        ]);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.dropped, 2);
    }

    #[test]
    fn test_later_duplicate_overwrites_earlier() {
        let n = SourceNormalizer::with_default_aliases(FeedSide::Price);
        let batch = n.normalize(&[
            raw(json!({"underlying": "TCS", "lastPrice": 3500})),
            raw(json!({"underlying": "TCS", "lastPrice": 3510})),
        ]);
        assert_eq!(batch.records["TCS"].last_price, 3510.0);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn test_custom_alias_table_drives_lookup() {
        let mut aliases = AliasTable::price_feed();
        aliases.last_price = vec!["px".to_string()];
        let n = SourceNormalizer::new(FeedSide::Price, aliases);
        let rec = n
            .normalize_one(&raw(json!({"underlying": "TCS", "lastPrice": 1, "px": 2})))
            .unwrap();
        assert_eq!(rec.last_price, 2.0);
    }

    #[test]
    fn test_round_2dp_handles_non_finite() {
        assert_eq!(round_2dp(f64::NAN), 0.0);
        assert_eq!(round_2dp(f64::INFINITY), 0.0);
        assert!(approx(round_2dp(1.005_000_1), 1.01));
    }
}
