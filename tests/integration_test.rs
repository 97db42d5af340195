//! Integration Tests - End-to-end Snapshot Job Runs
//!
//! Tests the interaction between the snapshot job, ports, and mock
//! adapters. Uses mockall for trait mocking and tokio::test for async
//! tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use mockall::mock;
use serde_json::{Value, json};

use oi_reconciler::adapters::feeds::FileFeed;
use oi_reconciler::adapters::persistence::JsonSnapshotStore;
use oi_reconciler::domain::calendar::TradingCalendar;
use oi_reconciler::domain::error::FeedError;
use oi_reconciler::domain::normalizer::SourceNormalizer;
use oi_reconciler::domain::record::{FeedSide, Provenance};
use oi_reconciler::ports::feed_source::FeedSource;
use oi_reconciler::ports::snapshot_store::{SnapshotItem, SnapshotStore};
use oi_reconciler::usecases::snapshot_job::{FeedBinding, JobSettings, RunOutcome, SnapshotJob};

// ---- Mock Definitions ----

mock! {
    pub Feed {}

    #[async_trait::async_trait]
    impl FeedSource for Feed {
        fn name(&self) -> String;
        async fn fetch(&self) -> Result<Value, FeedError>;
    }
}

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl SnapshotStore for Store {
        async fn put_latest(&self, item: &SnapshotItem) -> anyhow::Result<()>;
        async fn load_latest(&self, partition_key: &str, sort_key: &str)
            -> anyhow::Result<Option<SnapshotItem>>;
        async fn is_healthy(&self) -> bool;
    }
}

// ---- Fixtures ----

fn oi_payload() -> Value {
    json!({
        "data": [
            {"symbol": "TCS", "latestOI": 1000, "changeInOI": 100, "underlyingValue": 0},
            {"symbol": "SBIN", "latestOI": "2,400", "prevOI": "2,000", "changeInOI": "400"},
            {"latestOI": 5}
        ],
        "timestamp": "16-Oct-2026 15:30:00"
    })
}

fn price_payload() -> Value {
    json!({
        "data": [
            {"underlying": "TCS", "lastPrice": 3500, "openInterest": 0, "changeinOpenInterest": 0},
            {"underlying": "INFY", "lastPrice": "1,500.50", "openInterest": 800}
        ]
    })
}

fn feed(name: &'static str, payload: Result<Value, FeedError>, calls: usize) -> Arc<MockFeed> {
    let mut mock = MockFeed::new();
    mock.expect_name().return_const(name.to_string());
    mock.expect_fetch()
        .times(calls)
        .returning(move || payload.clone());
    Arc::new(mock)
}

fn unavailable(name: &str) -> Result<Value, FeedError> {
    Err(FeedError::Unavailable {
        feed: name.to_string(),
        reason: "connection reset".to_string(),
    })
}

fn calendar() -> TradingCalendar {
    let ist = FixedOffset::east_opt(330 * 60).unwrap();
    TradingCalendar::new(ist, BTreeSet::new(), true)
}

/// Friday, during market hours in IST.
fn trading_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 5, 0, 0).unwrap()
}

fn settings(dry_run: bool) -> JobSettings {
    JobSettings {
        partition_key: "NSE#OI".to_string(),
        sort_key: "LATEST".to_string(),
        dry_run,
    }
}

fn job(
    oi: Arc<MockFeed>,
    price: Arc<MockFeed>,
    store: MockStore,
    dry_run: bool,
) -> SnapshotJob {
    SnapshotJob::new(
        FeedBinding::new(oi, "/data", SourceNormalizer::with_default_aliases(FeedSide::OpenInterest)),
        FeedBinding::new(price, "/data", SourceNormalizer::with_default_aliases(FeedSide::Price)),
        Arc::new(store),
        calendar(),
        settings(dry_run),
    )
    .unwrap()
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_both_feeds_merge_and_persist() {
    let mut store = MockStore::new();
    store.expect_is_healthy().return_const(true);
    store
        .expect_put_latest()
        .times(1)
        .withf(|item: &SnapshotItem| {
            let records = item.records().unwrap();
            item.partition_key == "NSE#OI"
                && item.sort_key == "LATEST"
                && item.count == 3
                && records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>()
                    == ["INFY", "SBIN", "TCS"]
        })
        .returning(|_| Ok(()));

    let job = job(
        feed("oi-spurts", Ok(oi_payload()), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let report = job.run(trading_day()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Persisted);
    assert_eq!(report.provenance.merged, 1);
    assert_eq!(report.provenance.feed_a_only, 1);
    assert_eq!(report.provenance.feed_b_only, 1);
    assert_eq!(report.oi_feed.raw, 3);
    assert_eq!(report.oi_feed.dropped, 1);
    assert!(report.price_feed.available);
}

#[tokio::test]
async fn test_oi_feed_down_degrades_to_price_only() {
    let mut store = MockStore::new();
    store.expect_is_healthy().return_const(true);
    store
        .expect_put_latest()
        .times(1)
        .withf(|item: &SnapshotItem| {
            item.records()
                .unwrap()
                .iter()
                .all(|r| r.provenance == Provenance::FeedBOnly)
        })
        .returning(|_| Ok(()));

    let job = job(
        feed("oi-spurts", unavailable("oi-spurts"), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let report = job.run(trading_day()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Persisted);
    assert!(!report.oi_feed.available);
    assert_eq!(report.provenance.feed_b_only, 2);
    assert_eq!(report.total(), 2);
}

#[tokio::test]
async fn test_both_feeds_down_fails_without_writing() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", unavailable("oi-spurts"), 1),
        feed(
            "stock-futures",
            Err(FeedError::Http {
                feed: "stock-futures".to_string(),
                status: 403,
            }),
            1,
        ),
        store,
        false,
    );
    let err = job.run(trading_day()).await.unwrap_err();
    assert!(err.to_string().contains("Both feeds unavailable"));
}

#[tokio::test]
async fn test_oi_feed_without_records_degrades_to_price_only() {
    let mut store = MockStore::new();
    store.expect_is_healthy().return_const(true);
    store
        .expect_put_latest()
        .times(1)
        .withf(|item: &SnapshotItem| {
            let records = item.records().unwrap();
            records.len() == 2 && records.iter().all(|r| r.provenance == Provenance::FeedBOnly)
        })
        .returning(|_| Ok(()));

    // Rejected session cookie: 200 with an empty object body.
    let job = job(
        feed("oi-spurts", Ok(json!({})), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let report = job.run(trading_day()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Persisted);
    assert!(!report.oi_feed.available);
    assert_eq!(report.oi_feed.name, "oi-spurts");
    assert!(report.price_feed.available);
    assert_eq!(report.provenance.feed_b_only, 2);
}

#[tokio::test]
async fn test_both_feeds_without_records_fail_the_run() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(json!({})), 1),
        feed("stock-futures", unavailable("stock-futures"), 1),
        store,
        false,
    );
    let err = job.run(trading_day()).await.unwrap_err();
    assert!(err.to_string().contains("Both feeds unavailable"));
}

#[tokio::test]
async fn test_malformed_payload_fails_the_run() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(json!({"data": "under maintenance"})), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let err = job.run(trading_day()).await.unwrap_err();
    assert!(format!("{err:#}").contains("malformed input"));
}

#[tokio::test]
async fn test_weekend_skips_without_fetching() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(oi_payload()), 0),
        feed("stock-futures", Ok(price_payload()), 0),
        store,
        false,
    );
    let sunday = Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap();
    let report = job.run(sunday).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::MarketClosed);
    assert!(report.outcome.is_skip());
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn test_dry_run_does_not_persist() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(oi_payload()), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        true,
    );
    let report = job.run(trading_day()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::DryRun);
    assert_eq!(report.total(), 3);
}

#[tokio::test]
async fn test_empty_feeds_keep_previous_snapshot() {
    let mut store = MockStore::new();
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(json!({"data": []})), 1),
        feed("stock-futures", Ok(json!({"data": null})), 1),
        store,
        false,
    );
    let report = job.run(trading_day()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::NoData);
}

#[tokio::test]
async fn test_store_failure_fails_the_run() {
    let mut store = MockStore::new();
    store.expect_is_healthy().return_const(true);
    store
        .expect_put_latest()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("disk full")));

    let job = job(
        feed("oi-spurts", Ok(oi_payload()), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let err = job.run(trading_day()).await.unwrap_err();
    assert!(format!("{err:#}").contains("disk full"));
}

#[tokio::test]
async fn test_unhealthy_store_is_not_written() {
    let mut store = MockStore::new();
    store.expect_is_healthy().times(1).return_const(false);
    store.expect_put_latest().times(0);

    let job = job(
        feed("oi-spurts", Ok(oi_payload()), 1),
        feed("stock-futures", Ok(price_payload()), 1),
        store,
        false,
    );
    let err = job.run(trading_day()).await.unwrap_err();
    assert!(err.to_string().contains("not writable"));
}

#[tokio::test]
async fn test_swapped_bindings_rejected() {
    let result = SnapshotJob::new(
        FeedBinding::new(
            feed("stock-futures", Ok(price_payload()), 0),
            "/data",
            SourceNormalizer::with_default_aliases(FeedSide::Price),
        ),
        FeedBinding::new(
            feed("oi-spurts", Ok(oi_payload()), 0),
            "/data",
            SourceNormalizer::with_default_aliases(FeedSide::OpenInterest),
        ),
        Arc::new(MockStore::new()),
        calendar(),
        settings(false),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_file_feeds_to_json_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let oi_path = dir.path().join("oi.json");
    let price_path = dir.path().join("price.json");
    std::fs::write(&oi_path, oi_payload().to_string()).unwrap();
    std::fs::write(&price_path, price_payload().to_string()).unwrap();

    let data_dir = dir.path().join("data");
    let store = Arc::new(JsonSnapshotStore::new(data_dir.to_str().unwrap()).await.unwrap());

    let job = SnapshotJob::new(
        FeedBinding::new(
            Arc::new(FileFeed::new("oi-spurts", &oi_path)),
            "/data",
            SourceNormalizer::with_default_aliases(FeedSide::OpenInterest),
        ),
        FeedBinding::new(
            Arc::new(FileFeed::new("stock-futures", &price_path)),
            "/data",
            SourceNormalizer::with_default_aliases(FeedSide::Price),
        ),
        Arc::clone(&store) as Arc<dyn SnapshotStore>,
        calendar(),
        settings(false),
    )
    .unwrap();

    let first = job.run(trading_day()).await.unwrap();
    let saved = store.load_latest("NSE#OI", "LATEST").await.unwrap().unwrap();
    let records = saved.records().unwrap();

    let tcs = records.iter().find(|r| r.symbol == "TCS").unwrap();
    assert_eq!(tcs.open_interest, 1000.0);
    assert_eq!(tcs.last_price, 3500.0);
    assert!((tcs.percent_change_in_open_interest - 11.11).abs() < 1e-9);
    assert_eq!(tcs.provenance, Provenance::Merged);

    let sbin = records.iter().find(|r| r.symbol == "SBIN").unwrap();
    assert!((sbin.percent_change_in_open_interest - 20.0).abs() < 1e-9);
    assert_eq!(sbin.provenance, Provenance::FeedAOnly);

    let infy = records.iter().find(|r| r.symbol == "INFY").unwrap();
    assert_eq!(infy.last_price, 1500.5);
    assert_eq!(infy.provenance, Provenance::FeedBOnly);

    assert_eq!(saved.run_id, first.run_id);
    assert_eq!(saved.timestamp, "2026-10-16T05:00:00.000Z");

    // Same inputs, same instant: identical record payload.
    job.run(trading_day()).await.unwrap();
    let again = store.load_latest("NSE#OI", "LATEST").await.unwrap().unwrap();
    assert_eq!(again.data, saved.data);
}
