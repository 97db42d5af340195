//! Snapshot Job - One Reconciliation Run
//!
//! Wiring per run:
//! 1. Calendar gate (closed day -> skipped, nothing persisted)
//! 2. Fetch both feeds concurrently, one attempt each
//! 3. Extract + normalize each payload (failed or empty-handed feed ->
//!    empty batch)
//! 4. Reconcile OI feed with price feed
//! 5. Persist the snapshot item (unless dry-run or empty), after a store
//!    health check
//!
//! A feed is unavailable when its fetch fails or its payload carries no
//! record collection. A single unavailable feed degrades the run; both
//! unavailable fails it. Malformed payloads always fail it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::calendar::TradingCalendar;
use crate::domain::error::FeedError;
use crate::domain::normalizer::{NormalizedBatch, SourceNormalizer};
use crate::domain::reconciler::{ProvenanceSummary, reconcile};
use crate::domain::record::{FeedSide, records_from_payload};
use crate::ports::feed_source::FeedSource;
use crate::ports::snapshot_store::{SnapshotItem, SnapshotStore};

/// A feed together with how to read its payload.
pub struct FeedBinding {
    /// Payload source.
    pub source: Arc<dyn FeedSource>,
    /// JSON pointer to the record array.
    pub records_pointer: String,
    /// Feed-specific normalizer (carries the feed's role).
    pub normalizer: SourceNormalizer,
}

impl FeedBinding {
    pub fn new(
        source: Arc<dyn FeedSource>,
        records_pointer: impl Into<String>,
        normalizer: SourceNormalizer,
    ) -> Self {
        Self {
            source,
            records_pointer: records_pointer.into(),
            normalizer,
        }
    }

    pub fn side(&self) -> FeedSide {
        self.normalizer.side()
    }
}

/// Storage keys and run mode.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub partition_key: String,
    pub sort_key: String,
    /// Reconcile but do not persist.
    pub dry_run: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Snapshot written.
    Persisted,
    /// Snapshot computed, write suppressed.
    DryRun,
    /// Exchange closed on the run date.
    MarketClosed,
    /// Feeds answered but yielded no symbols; last snapshot kept.
    NoData,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persisted => "persisted",
            Self::DryRun => "dry_run",
            Self::MarketClosed => "market_closed",
            Self::NoData => "no_data",
        }
    }

    pub fn is_skip(self) -> bool {
        matches!(self, Self::MarketClosed | Self::NoData)
    }
}

/// Per-feed counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedReport {
    pub name: String,
    /// Whether the fetch succeeded.
    pub available: bool,
    /// Raw records in the payload.
    pub raw: usize,
    /// Distinct symbols after normalization.
    pub normalized: usize,
    /// Records dropped for lack of a symbol.
    pub dropped: usize,
    /// Records that overwrote an earlier one of the same symbol.
    pub duplicates: usize,
}

/// Summary of one run, used for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub captured_at: DateTime<Utc>,
    pub oi_feed: FeedReport,
    pub price_feed: FeedReport,
    pub provenance: ProvenanceSummary,
}

impl RunReport {
    fn skipped(run_id: Uuid, outcome: RunOutcome, captured_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            outcome,
            captured_at,
            oi_feed: FeedReport::default(),
            price_feed: FeedReport::default(),
            provenance: ProvenanceSummary::default(),
        }
    }

    /// Records in the reconciled snapshot.
    pub fn total(&self) -> usize {
        self.provenance.total()
    }
}

/// Reconciliation job over one OI feed and one price feed.
pub struct SnapshotJob {
    oi: FeedBinding,
    price: FeedBinding,
    store: Arc<dyn SnapshotStore>,
    calendar: TradingCalendar,
    settings: JobSettings,
}

impl SnapshotJob {
    /// Create a new job.
    ///
    /// # Errors
    /// Fails when the bindings are not one OI feed and one price feed.
    pub fn new(
        oi: FeedBinding,
        price: FeedBinding,
        store: Arc<dyn SnapshotStore>,
        calendar: TradingCalendar,
        settings: JobSettings,
    ) -> Result<Self> {
        anyhow::ensure!(
            oi.side() == FeedSide::OpenInterest && price.side() == FeedSide::Price,
            "SnapshotJob needs an open_interest feed and a price feed, got {} and {}",
            oi.side(),
            price.side()
        );
        Ok(Self {
            oi,
            price,
            store,
            calendar,
            settings,
        })
    }

    /// Execute one run at `now`.
    ///
    /// # Errors
    /// - both feeds unavailable
    /// - a payload is not a record collection
    /// - the snapshot store is unhealthy or the write fails
    #[instrument(skip(self), fields(run_id))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        if let Some(reason) = self.calendar.closed_reason(now) {
            info!(
                date = %self.calendar.local_date(now),
                reason = reason.as_str(),
                "Exchange closed, skipping run"
            );
            return Ok(RunReport::skipped(run_id, RunOutcome::MarketClosed, now));
        }

        let (oi_payload, price_payload) =
            tokio::join!(self.oi.source.fetch(), self.price.source.fetch());

        let (oi_batch, oi_feed) = ingest(&self.oi, oi_payload)?;
        let (price_batch, price_feed) = ingest(&self.price, price_payload)?;

        if !oi_feed.available && !price_feed.available {
            anyhow::bail!(
                "Both feeds unavailable: {}, {}",
                oi_feed.name,
                price_feed.name
            );
        }

        let reconciled = reconcile(&oi_batch.records, &price_batch.records)
            .context("Reconciliation rejected normalized input")?;
        let provenance = reconciled.summary();

        info!(
            symbols = reconciled.len(),
            merged = provenance.merged,
            oi_only = provenance.feed_a_only,
            price_only = provenance.feed_b_only,
            "Feeds reconciled"
        );

        let mut report = RunReport {
            run_id,
            outcome: RunOutcome::Persisted,
            captured_at: now,
            oi_feed,
            price_feed,
            provenance,
        };

        if reconciled.is_empty() {
            warn!("Reconciled snapshot is empty, keeping previous snapshot");
            report.outcome = RunOutcome::NoData;
            return Ok(report);
        }

        let item = SnapshotItem::new(
            &self.settings.partition_key,
            &self.settings.sort_key,
            &reconciled.to_vec(),
            now,
            run_id,
        )
        .context("Failed to serialize snapshot")?;

        if self.settings.dry_run {
            warn!(records = item.count, "Dry-run mode - snapshot NOT persisted");
            report.outcome = RunOutcome::DryRun;
            return Ok(report);
        }

        anyhow::ensure!(
            self.store.is_healthy().await,
            "Snapshot store is not writable, keeping previous snapshot"
        );

        self.store
            .put_latest(&item)
            .await
            .context("Failed to persist snapshot")?;

        Ok(report)
    }
}

/// Turn one fetch result into a normalized batch and its report.
///
/// A failed fetch, or a payload without a record collection, becomes an
/// empty batch reported as unavailable. A malformed collection is an error.
fn ingest(
    binding: &FeedBinding,
    payload: Result<Value, FeedError>,
) -> Result<(NormalizedBatch, FeedReport)> {
    let name = binding.source.name();

    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => {
            warn!(feed = %name, error = %e, "Feed unavailable, continuing without it");
            return Ok(unavailable(name));
        }
    };

    let Some(raw) = records_from_payload(&name, &payload, &binding.records_pointer)? else {
        warn!(
            feed = %name,
            pointer = %binding.records_pointer,
            "Feed answered without a record collection, continuing without it"
        );
        return Ok(unavailable(name));
    };
    let batch = binding.normalizer.normalize(&raw);

    if batch.dropped > 0 {
        debug!(feed = %name, dropped = batch.dropped, "Dropped records without symbol");
    }
    info!(
        feed = %name,
        side = %binding.side(),
        raw = raw.len(),
        symbols = batch.records.len(),
        "Feed normalized"
    );

    let report = FeedReport {
        name,
        available: true,
        raw: raw.len(),
        normalized: batch.records.len(),
        dropped: batch.dropped,
        duplicates: batch.duplicates,
    };
    Ok((batch, report))
}

fn unavailable(name: String) -> (NormalizedBatch, FeedReport) {
    let report = FeedReport {
        name,
        ..FeedReport::default()
    };
    (NormalizedBatch::default(), report)
}
