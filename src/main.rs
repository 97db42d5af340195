//! OI Reconciler: Entry Point
//!
//! Runs one reconciliation and exits. Takes no flags; the config path
//! comes from `OI_RECONCILER_CONFIG` (default `config.toml`).
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build both feed adapters (HTTP session or file)
//! 4. Build the snapshot store and exchange calendar
//! 5. Run SnapshotJob once
//! 6. Write run metrics (if configured)
//! 7. Exit 0 on success or skip, non-zero on failure

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use oi_reconciler::adapters::feeds::build_feed;
use oi_reconciler::adapters::metrics::RunMetrics;
use oi_reconciler::adapters::persistence::JsonSnapshotStore;
use oi_reconciler::config::{self, AppConfig};
use oi_reconciler::domain::normalizer::SourceNormalizer;
use oi_reconciler::domain::record::FeedSide;
use oi_reconciler::usecases::snapshot_job::{FeedBinding, JobSettings, RunReport, SnapshotJob};

const CONFIG_ENV: &str = "OI_RECONCILER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.run.log_level)
                }),
        )
        .json()
        .init();

    info!(
        path = %config_path,
        holidays = config.run.holidays.len(),
        "Configuration loaded successfully"
    );
    info!(
        name = %config.run.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.run.dry_run,
        oi_feed = %config.feeds.oi.name,
        price_feed = %config.feeds.price.name,
        "Starting OI reconciler"
    );

    let metrics = if config.metrics.enabled {
        Some(RunMetrics::new().context("Failed to register metrics")?)
    } else {
        None
    };

    // ── 3-5. Build the job and run it once ──────────────────
    let result = match build_job(&config).await {
        Ok(job) => job.run(Utc::now()).await,
        Err(e) => Err(e),
    };

    // ── 6. Metrics ──────────────────────────────────────────
    if let Some(metrics) = &metrics {
        match &result {
            Ok(report) => metrics.observe(report),
            Err(_) => metrics.observe_failure(),
        }
        if let Some(path) = &config.metrics.textfile_path {
            if let Err(e) = metrics.write_textfile(path).await {
                error!(error = %e, "Failed to write run metrics");
            }
        }
    }

    // ── 7. Exit status ──────────────────────────────────────
    match result {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Reconciliation run failed");
            Err(e)
        }
    }
}

/// Wire adapters and domain components from config.
async fn build_job(config: &AppConfig) -> Result<SnapshotJob> {
    let binding = |side: FeedSide| -> Result<FeedBinding> {
        let feed = config.feeds.for_side(side);
        let source = build_feed(feed)
            .with_context(|| format!("Failed to create feed {}", feed.name))?;
        let normalizer = SourceNormalizer::new(side, feed.alias_table(side));
        Ok(FeedBinding::new(source, feed.records_pointer.clone(), normalizer))
    };

    let store = JsonSnapshotStore::new(&config.persistence.data_dir)
        .await
        .context("Failed to open snapshot store")?;

    let calendar = config::loader::build_calendar(&config.run)?;

    SnapshotJob::new(
        binding(FeedSide::OpenInterest)?,
        binding(FeedSide::Price)?,
        Arc::new(store),
        calendar,
        JobSettings {
            partition_key: config.persistence.partition_key.clone(),
            sort_key: config.persistence.sort_key.clone(),
            dry_run: config.run.dry_run,
        },
    )
}

fn log_report(report: &RunReport) {
    info!(
        run_id = %report.run_id,
        outcome = report.outcome.as_str(),
        skipped = report.outcome.is_skip(),
        symbols = report.total(),
        merged = report.provenance.merged,
        oi_only = report.provenance.feed_a_only,
        price_only = report.provenance.feed_b_only,
        oi_available = report.oi_feed.available,
        price_available = report.price_feed.available,
        "Run complete"
    );
}
