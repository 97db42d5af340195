//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate};

use super::{AppConfig, FeedConfig, FeedKind, RunConfig};
use crate::domain::calendar::TradingCalendar;
use crate::domain::record::FeedSide;

/// Largest UTC offset any exchange uses, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Load and validate configuration from a TOML file.
///
/// Emits no log events: it runs before the subscriber is installed.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Build the exchange calendar described by `[run]`.
pub fn build_calendar(run: &RunConfig) -> Result<TradingCalendar> {
  anyhow::ensure!(
    run.utc_offset_minutes.abs() <= MAX_OFFSET_MINUTES,
    "utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {}",
    run.utc_offset_minutes
  );
  let offset = FixedOffset::east_opt(run.utc_offset_minutes * 60)
    .with_context(|| format!("Invalid UTC offset: {} minutes", run.utc_offset_minutes))?;

  let holidays = run
    .holidays
    .iter()
    .map(|raw| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid holiday date '{raw}', expected YYYY-MM-DD"))
    })
    .collect::<Result<BTreeSet<_>>>()?;

  Ok(TradingCalendar::new(offset, holidays, run.skip_weekends))
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty names, URLs and storage keys
/// - Valid JSON pointers
/// - Non-empty alias lists after overrides
/// - Parseable holidays and a sane UTC offset
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.run.name.is_empty(), "run.name must not be empty");

  build_calendar(&config.run)?;

  validate_feed(&config.feeds.oi, FeedSide::OpenInterest)?;
  validate_feed(&config.feeds.price, FeedSide::Price)?;
  anyhow::ensure!(
    config.feeds.oi.name != config.feeds.price.name,
    "Feed names must differ, both are '{}'",
    config.feeds.oi.name
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );
  anyhow::ensure!(
    !config.persistence.partition_key.is_empty(),
    "persistence.partition_key must not be empty"
  );
  anyhow::ensure!(
    !config.persistence.sort_key.is_empty(),
    "persistence.sort_key must not be empty"
  );

  if let Some(path) = &config.metrics.textfile_path {
    anyhow::ensure!(!path.is_empty(), "metrics.textfile_path must not be empty when set");
  }

  Ok(())
}

fn validate_feed(feed: &FeedConfig, side: FeedSide) -> Result<()> {
  anyhow::ensure!(!feed.name.is_empty(), "Feed ({side}) has empty name");
  anyhow::ensure!(
    !feed.url.is_empty(),
    "Feed {} ({side}) has empty url",
    feed.name
  );

  if feed.kind == FeedKind::Http {
    anyhow::ensure!(
      feed.url.starts_with("http://") || feed.url.starts_with("https://"),
      "Feed {} url must be http(s), got {}",
      feed.name,
      feed.url
    );
    anyhow::ensure!(
      feed.timeout_seconds > 0,
      "Feed {} timeout_seconds must be positive",
      feed.name
    );
  }

  anyhow::ensure!(
    feed.records_pointer.is_empty() || feed.records_pointer.starts_with('/'),
    "Feed {} records_pointer must be empty or start with '/', got '{}'",
    feed.name,
    feed.records_pointer
  );

  if let Some(field) = feed.alias_table(side).first_invalid_field() {
    anyhow::bail!(
      "Feed {} alias list '{}' must be non-empty with no blank names",
      feed.name,
      field.key()
    );
  }

  Ok(())
}
