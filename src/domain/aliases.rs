//! Field-name alias tables.
//!
//! Each upstream renames fields between revisions, so every canonical
//! field maps to an ordered list of candidate names per feed. Earlier
//! entries win. New aliases are a config change, never a code change.

use serde::{Deserialize, Serialize};

use super::record::FeedSide;

/// Canonical fields that are looked up through an alias list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Symbol,
    LastPrice,
    OpenInterest,
    ChangeInOpenInterest,
    PreviousOpenInterest,
    PercentChangeInOpenInterest,
}

impl CanonicalField {
    pub const ALL: [Self; 6] = [
        Self::Symbol,
        Self::LastPrice,
        Self::OpenInterest,
        Self::ChangeInOpenInterest,
        Self::PreviousOpenInterest,
        Self::PercentChangeInOpenInterest,
    ];

    /// Config key for this field.
    pub fn key(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::LastPrice => "last_price",
            Self::OpenInterest => "open_interest",
            Self::ChangeInOpenInterest => "change_in_open_interest",
            Self::PreviousOpenInterest => "previous_open_interest",
            Self::PercentChangeInOpenInterest => "percent_change_in_open_interest",
        }
    }
}

/// Ordered candidate names for every canonical field of one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    pub symbol: Vec<String>,
    pub last_price: Vec<String>,
    pub open_interest: Vec<String>,
    pub change_in_open_interest: Vec<String>,
    pub previous_open_interest: Vec<String>,
    pub percent_change_in_open_interest: Vec<String>,
}

/// Partial table from config; `None` keeps the built-in list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasOverrides {
    pub symbol: Option<Vec<String>>,
    pub last_price: Option<Vec<String>>,
    pub open_interest: Option<Vec<String>>,
    pub change_in_open_interest: Option<Vec<String>>,
    pub previous_open_interest: Option<Vec<String>>,
    pub percent_change_in_open_interest: Option<Vec<String>>,
}

impl AliasTable {
    /// Built-in table for the open-interest feed (OI spurts shape).
    pub fn open_interest_feed() -> Self {
        Self {
            symbol: names(&["symbol", "underlying"]),
            last_price: names(&["underlyingValue", "lastPrice", "ltp"]),
            open_interest: names(&["latestOI", "latestOi", "openInterest"]),
            change_in_open_interest: names(&["changeInOI", "changeInOi", "changeinOpenInterest"]),
            previous_open_interest: names(&["prevOI", "previousOI", "prevOi"]),
            percent_change_in_open_interest: names(&[
                "pchangeinOpenInterest",
                "pChangeInOI",
                "percentChangeInOI",
            ]),
        }
    }

    /// Built-in table for the price feed (stock futures shape).
    pub fn price_feed() -> Self {
        Self {
            symbol: names(&["underlying", "symbol"]),
            last_price: names(&["lastPrice", "ltp", "last"]),
            open_interest: names(&["openInterest", "latestOI"]),
            change_in_open_interest: names(&[
                "changeinOpenInterest",
                "changeInOpenInterest",
                "changeInOI",
            ]),
            previous_open_interest: names(&["prevOI", "previousOI"]),
            percent_change_in_open_interest: names(&[
                "pchangeinOpenInterest",
                "pChangeInOpenInterest",
            ]),
        }
    }

    /// Built-in table for a feed role.
    pub fn for_side(side: FeedSide) -> Self {
        match side {
            FeedSide::OpenInterest => Self::open_interest_feed(),
            FeedSide::Price => Self::price_feed(),
        }
    }

    /// Replace every list the overrides name.
    pub fn with_overrides(mut self, overrides: &AliasOverrides) -> Self {
        let pairs = [
            (&mut self.symbol, &overrides.symbol),
            (&mut self.last_price, &overrides.last_price),
            (&mut self.open_interest, &overrides.open_interest),
            (&mut self.change_in_open_interest, &overrides.change_in_open_interest),
            (&mut self.previous_open_interest, &overrides.previous_open_interest),
            (
                &mut self.percent_change_in_open_interest,
                &overrides.percent_change_in_open_interest,
            ),
        ];
        for (slot, replacement) in pairs {
            if let Some(list) = replacement {
                slot.clone_from(list);
            }
        }
        self
    }

    /// Candidate names for a field, in precedence order.
    pub fn candidates(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Symbol => &self.symbol,
            CanonicalField::LastPrice => &self.last_price,
            CanonicalField::OpenInterest => &self.open_interest,
            CanonicalField::ChangeInOpenInterest => &self.change_in_open_interest,
            CanonicalField::PreviousOpenInterest => &self.previous_open_interest,
            CanonicalField::PercentChangeInOpenInterest => {
                &self.percent_change_in_open_interest
            }
        }
    }

    /// First field whose candidate list is empty or holds a blank name.
    pub fn first_invalid_field(&self) -> Option<CanonicalField> {
        CanonicalField::ALL.into_iter().find(|&field| {
            let list = self.candidates(field);
            list.is_empty() || list.iter().any(|name| name.trim().is_empty())
        })
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}
