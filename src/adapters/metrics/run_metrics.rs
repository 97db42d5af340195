//! Prometheus Run Metrics - Batch Job Observability
//!
//! Registers per-run gauges and counters and renders them in the
//! Prometheus text format. A batch job exits before it could be
//! scraped, so the rendered text is written to a node_exporter
//! textfile collector path instead of being served.

use std::path::Path;

use anyhow::{Context, Result};
use prometheus::{
    Encoder, Gauge, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::record::Provenance;
use crate::usecases::snapshot_job::{FeedReport, RunOutcome, RunReport};

/// Centralized Prometheus metrics for one job process.
///
/// All metrics follow the naming convention `oi_reconciler_*`.
pub struct RunMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Runs by outcome (persisted, dry_run, market_closed, no_data, failed).
    pub runs: IntCounterVec,
    /// Final records by provenance.
    pub records: IntGaugeVec,
    /// Feed availability (1 = fetched, 0 = unavailable).
    pub feed_available: IntGaugeVec,
    /// Feed record counts by stage (raw, normalized, dropped, duplicates).
    pub feed_records: IntGaugeVec,
    /// Total records in the last snapshot.
    pub snapshot_records: IntGauge,
    /// Unix time of the last persisted snapshot.
    pub last_success_timestamp: Gauge,
}

impl RunMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let runs = IntCounterVec::new(
            Opts::new("oi_reconciler_runs_total", "Reconciliation runs by outcome"),
            &["outcome"],
        )?;

        let records = IntGaugeVec::new(
            Opts::new(
                "oi_reconciler_records",
                "Reconciled records by provenance",
            ),
            &["provenance"],
        )?;

        let feed_available = IntGaugeVec::new(
            Opts::new(
                "oi_reconciler_feed_available",
                "Feed fetch status (1=fetched, 0=unavailable)",
            ),
            &["feed"],
        )?;

        let feed_records = IntGaugeVec::new(
            Opts::new("oi_reconciler_feed_records", "Feed record counts by stage"),
            &["feed", "stage"],
        )?;

        let snapshot_records = IntGauge::new(
            "oi_reconciler_snapshot_records",
            "Records in the last reconciled snapshot",
        )?;

        let last_success_timestamp = Gauge::new(
            "oi_reconciler_last_success_timestamp_seconds",
            "Unix time of the last persisted snapshot",
        )?;

        // Register all metrics
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(records.clone()))?;
        registry.register(Box::new(feed_available.clone()))?;
        registry.register(Box::new(feed_records.clone()))?;
        registry.register(Box::new(snapshot_records.clone()))?;
        registry.register(Box::new(last_success_timestamp.clone()))?;

        Ok(Self {
            registry,
            runs,
            records,
            feed_available,
            feed_records,
            snapshot_records,
            last_success_timestamp,
        })
    }

    /// Record a completed run.
    pub fn observe(&self, report: &RunReport) {
        self.runs.with_label_values(&[report.outcome.as_str()]).inc();
        if report.outcome == RunOutcome::MarketClosed {
            return;
        }

        for provenance in [Provenance::FeedAOnly, Provenance::FeedBOnly, Provenance::Merged] {
            self.records
                .with_label_values(&[provenance.as_str()])
                .set(gauge_value(report.provenance.count(provenance)));
        }
        self.snapshot_records.set(gauge_value(report.total()));

        self.observe_feed(&report.oi_feed);
        self.observe_feed(&report.price_feed);

        if report.outcome == RunOutcome::Persisted {
            #[allow(clippy::cast_precision_loss)]
            let unix_seconds = report.captured_at.timestamp() as f64;
            self.last_success_timestamp.set(unix_seconds);
        }
    }

    /// Record a run that ended in an error.
    pub fn observe_failure(&self) {
        self.runs.with_label_values(&["failed"]).inc();
    }

    fn observe_feed(&self, feed: &FeedReport) {
        if feed.name.is_empty() {
            return;
        }
        self.feed_available
            .with_label_values(&[feed.name.as_str()])
            .set(i64::from(feed.available));
        for (stage, count) in [
            ("raw", feed.raw),
            ("normalized", feed.normalized),
            ("dropped", feed.dropped),
            ("duplicates", feed.duplicates),
        ] {
            self.feed_records
                .with_label_values(&[feed.name.as_str(), stage])
                .set(gauge_value(count));
        }
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics are not valid UTF-8")
    }

    /// Atomically write the rendered metrics to a textfile collector path.
    #[instrument(skip(self))]
    pub async fn write_textfile(&self, path: &str) -> Result<()> {
        let path = Path::new(path);
        let tmp_path = path.with_extension("prom.tmp");

        fs::write(&tmp_path, self.render()?)
            .await
            .context("Failed to write tmp metrics file")?;
        fs::rename(&tmp_path, path)
            .await
            .context("Failed to rename metrics file")?;

        info!(path = %path.display(), "Run metrics written");
        Ok(())
    }
}

fn gauge_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
