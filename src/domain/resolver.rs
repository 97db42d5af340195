//! Field Resolver - alias-driven numeric lookup.
//!
//! Missing data is modelled as zero, never as an error: upstreams omit
//! fields routinely without signalling failure.

use serde_json::Value;

use super::record::RawRecord;

/// Characters stripped from numeric strings before parsing.
const GROUPING_SEPARATORS: [char; 4] = [',', ' ', '\u{a0}', '\u{202f}'];

/// First coercible value among `candidates`, or `0.0`.
pub fn resolve<S: AsRef<str>>(record: &RawRecord, candidates: &[S]) -> f64 {
    resolve_present(record, candidates).unwrap_or(0.0)
}

/// First coercible value among `candidates`, if any.
///
/// Candidates are scanned in order. Absent and `null` fields are
/// skipped, and so is a present value that fails coercion, so a later
/// alias can still answer.
pub fn resolve_present<S: AsRef<str>>(record: &RawRecord, candidates: &[S]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|name| record.get(name.as_ref()))
        .filter(|value| !value.is_null())
        .find_map(coerce_number)
}

/// First non-blank string among `candidates`, trimmed.
pub fn resolve_symbol<S: AsRef<str>>(record: &RawRecord, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|name| record.get(name.as_ref()))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Coerce a JSON value to a finite number.
///
/// Strings may carry thousands separators (`"1,200"`). Booleans,
/// arrays, objects, placeholders like `"-"`, and non-finite results
/// do not coerce.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_grouped(s),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn parse_grouped(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !GROUPING_SEPARATORS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_grouped_string_resolves() {
        let r = record(json!({"prevOI": "1,200"}));
        assert_eq!(resolve(&r, &["prevOI", "previousOI"]), 1200.0);
    }

    #[test]
    fn test_earlier_alias_wins() {
        let r = record(json!({"latestOI": 10, "openInterest": 20}));
        assert_eq!(resolve(&r, &["latestOI", "openInterest"]), 10.0);
        assert_eq!(resolve(&r, &["openInterest", "latestOI"]), 20.0);
    }

    #[test]
    fn test_null_is_skipped() {
        let r = record(json!({"latestOI": null, "openInterest": 7}));
        assert_eq!(resolve(&r, &["latestOI", "openInterest"]), 7.0);
    }

    #[test]
    fn test_uncoercible_falls_through_to_next_alias() {
        let r = record(json!({"lastPrice": "-", "ltp": "3,512.40"}));
        assert_eq!(resolve(&r, &["lastPrice", "ltp"]), 3512.4);
    }

    #[test]
    fn test_missing_resolves_to_zero() {
        let r = record(json!({"symbol": "TCS"}));
        assert_eq!(resolve(&r, &["latestOI"]), 0.0);
        assert_eq!(resolve_present(&r, &["latestOI"]), None);
    }

    #[test]
    fn test_all_coercions_fail_resolves_to_zero() {
        let r = record(json!({"a": true, "b": "n/a", "c": [1], "d": ""}));
        assert_eq!(resolve(&r, &["a", "b", "c", "d"]), 0.0);
    }

    #[test]
    fn test_non_finite_strings_rejected() {
        let r = record(json!({"a": "inf", "b": "NaN"}));
        assert_eq!(resolve_present(&r, &["a", "b"]), None);
    }

    #[test]
    fn test_negative_and_decimal_strings() {
        let r = record(json!({"chg": "-1,250.75"}));
        assert_eq!(resolve(&r, &["chg"]), -1250.75);
    }

    #[test]
    fn test_symbol_skips_blank_and_non_string() {
        let r = record(json!({"symbol": "  ", "underlying": 5, "ticker": " TCS "}));
        assert_eq!(
            resolve_symbol(&r, &["symbol", "underlying", "ticker"]),
            Some("TCS".to_string())
        );
        assert_eq!(resolve_symbol(&r, &["symbol"]), None);
    }
}
