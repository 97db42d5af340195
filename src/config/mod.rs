//! Configuration Module - TOML-based Job Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Feed endpoints, headers, alias tables and storage keys are all
//! externalized here - nothing is hardcoded in the domain layer
//! beyond the built-in alias defaults.

pub mod loader;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::aliases::{AliasOverrides, AliasTable};
use crate::domain::record::FeedSide;

/// Top-level job configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any feed is contacted.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Job identity and calendar settings.
  pub run: RunConfig,
  /// The two upstream feeds.
  pub feeds: FeedsConfig,
  /// Snapshot persistence.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Run metrics export.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Job identity and calendar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
  /// Human-readable job name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Reconcile but do not persist.
  #[serde(default)]
  pub dry_run: bool,
  /// Exchange-local UTC offset in minutes (330 = IST).
  #[serde(default = "default_utc_offset")]
  pub utc_offset_minutes: i32,
  /// Skip runs on Saturday and Sunday (exchange-local).
  #[serde(default = "default_true")]
  pub skip_weekends: bool,
  /// Exchange holidays as `YYYY-MM-DD`.
  #[serde(default)]
  pub holidays: Vec<String>,
}

/// Both upstream feeds, by reconciliation role.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
  /// Feed A: authoritative for open interest.
  pub oi: FeedConfig,
  /// Feed B: authoritative for price.
  pub price: FeedConfig,
}

impl FeedsConfig {
  /// Config of the feed playing `side`.
  pub fn for_side(&self, side: FeedSide) -> &FeedConfig {
    match side {
      FeedSide::OpenInterest => &self.oi,
      FeedSide::Price => &self.price,
    }
  }
}

/// How a feed's payload is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
  /// HTTP GET with a cookie session.
  #[default]
  Http,
  /// JSON file on disk (fixtures, replays).
  File,
}

/// Single upstream feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// Feed name for logs and metrics.
  pub name: String,
  /// Acquisition mechanism.
  #[serde(default)]
  pub kind: FeedKind,
  /// Data URL (http) or file path (file).
  pub url: String,
  /// Page fetched first to obtain session cookies.
  pub warmup_url: Option<String>,
  /// JSON pointer to the record array; `""` is the payload root.
  #[serde(default = "default_records_pointer")]
  pub records_pointer: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Extra request headers (User-Agent, Referer, ...).
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
  /// Env var holding an opaque bearer token.
  pub bearer_token_env: Option<String>,
  /// Alias list overrides; omitted fields keep the built-in table.
  #[serde(default)]
  pub aliases: AliasOverrides,
}

impl FeedConfig {
  /// Effective alias table for this feed in role `side`.
  pub fn alias_table(&self, side: FeedSide) -> AliasTable {
    AliasTable::for_side(side).with_overrides(&self.aliases)
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_seconds)
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory holding snapshot files.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// Partition key of the snapshot item.
  #[serde(default = "default_partition_key")]
  pub partition_key: String,
  /// Sort key of the snapshot item ("latest snapshot").
  #[serde(default = "default_sort_key")]
  pub sort_key: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      partition_key: default_partition_key(),
      sort_key: default_sort_key(),
    }
  }
}

/// Run metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Record Prometheus run metrics.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// node_exporter textfile collector target.
  pub textfile_path: Option<String>,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      textfile_path: None,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_utc_offset() -> i32 {
  330
}

fn default_records_pointer() -> String {
  "/data".to_string()
}

fn default_timeout() -> u64 {
  10
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_partition_key() -> String {
  "NSE#OI".to_string()
}

fn default_sort_key() -> String {
  "LATEST".to_string()
}
