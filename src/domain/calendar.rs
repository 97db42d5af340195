//! Trading-day gate.
//!
//! Runs outside exchange sessions are skipped rather than persisted,
//! so the last good snapshot survives weekends and holidays.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc, Weekday};

/// Why a run did not produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    Weekend,
    Holiday,
}

impl ClosedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekend => "weekend",
            Self::Holiday => "holiday",
        }
    }
}

/// Exchange calendar evaluated in exchange-local time.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    offset: FixedOffset,
    holidays: BTreeSet<NaiveDate>,
    skip_weekends: bool,
}

impl TradingCalendar {
    pub fn new(offset: FixedOffset, holidays: BTreeSet<NaiveDate>, skip_weekends: bool) -> Self {
        Self {
            offset,
            holidays,
            skip_weekends,
        }
    }

    /// Calendar that never closes (fixtures, backfills).
    pub fn always_open() -> Self {
        Self::new(Utc.fix(), BTreeSet::new(), false)
    }

    /// Exchange-local date for an instant.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// `Some(reason)` when the exchange is closed on `now`'s local date.
    pub fn closed_reason(&self, now: DateTime<Utc>) -> Option<ClosedReason> {
        let date = self.local_date(now);
        if self.skip_weekends && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Some(ClosedReason::Weekend);
        }
        if self.holidays.contains(&date) {
            return Some(ClosedReason::Holiday);
        }
        None
    }

    pub fn is_trading_day(&self, now: DateTime<Utc>) -> bool {
        self.closed_reason(now).is_none()
    }
}
