//! HTTP Feed - Cookie-session REST Fetcher
//!
//! Wraps reqwest with an explicit per-feed configuration: default
//! headers, timeout, optional bearer token, and an optional warm-up
//! request that primes the cookie jar before the data request.
//! One attempt per fetch - no retries.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::FeedConfig;
use crate::domain::error::FeedError;
use crate::ports::feed_source::FeedSource;

/// Configuration for one HTTP feed session.
#[derive(Debug, Clone)]
pub struct HttpFeedConfig {
  /// Feed name for logs and errors.
  pub name: String,
  /// Data endpoint.
  pub url: String,
  /// Page fetched first to set session cookies.
  pub warmup_url: Option<String>,
  /// Request timeout (applies to each request).
  pub timeout: Duration,
  /// Headers sent with every request.
  pub headers: BTreeMap<String, String>,
  /// Opaque bearer token.
  pub bearer_token: Option<String>,
}

impl Default for HttpFeedConfig {
  fn default() -> Self {
    Self {
      name: "http-feed".to_string(),
      url: String::new(),
      warmup_url: None,
      timeout: Duration::from_secs(10),
      headers: BTreeMap::from([
        ("User-Agent".to_string(), "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
      ]),
      bearer_token: None,
    }
  }
}

impl HttpFeedConfig {
  /// Build from file config, reading the bearer token from its env var.
  ///
  /// # Errors
  /// Fails if `bearer_token_env` is set but the variable is missing.
  pub fn from_feed_config(feed: &FeedConfig) -> Result<Self> {
    let bearer_token = feed
      .bearer_token_env
      .as_deref()
      .map(|var| {
        std::env::var(var)
          .with_context(|| format!("Bearer token env var {var} not set for feed {}", feed.name))
      })
      .transpose()?;

    Ok(Self {
      name: feed.name.clone(),
      url: feed.url.clone(),
      warmup_url: feed.warmup_url.clone(),
      timeout: feed.timeout(),
      headers: feed.headers.clone(),
      bearer_token,
    })
  }
}

/// Best-effort HTTP feed with its own cookie session.
pub struct HttpFeed {
  /// Underlying HTTP client (cookie store enabled).
  http: Client,
  /// Feed configuration.
  config: HttpFeedConfig,
}

impl HttpFeed {
  /// Create a new HTTP feed.
  pub fn new(config: HttpFeedConfig) -> Result<Self> {
    let headers = header_map(&config.headers)?;

    let http = Client::builder()
      .cookie_store(true)
      .default_headers(headers)
      .timeout(config.timeout)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  /// Prime the cookie jar. Status codes are ignored; only transport
  /// failures abort the fetch.
  async fn warm_up(&self, url: &str) -> Result<(), FeedError> {
    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| self.unavailable(format!("warm-up request failed: {e}")))?;

    debug!(
      feed = %self.config.name,
      status = %response.status(),
      "Session warm-up complete"
    );
    Ok(())
  }

  fn unavailable(&self, reason: String) -> FeedError {
    FeedError::Unavailable {
      feed: self.config.name.clone(),
      reason,
    }
  }
}

#[async_trait]
impl FeedSource for HttpFeed {
  fn name(&self) -> String {
    self.config.name.clone()
  }

  #[instrument(skip(self), fields(feed = %self.config.name))]
  async fn fetch(&self) -> Result<Value, FeedError> {
    if let Some(warmup) = &self.config.warmup_url {
      self.warm_up(warmup).await?;
    }

    let mut request = self.http.get(&self.config.url);
    if let Some(token) = &self.config.bearer_token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| self.unavailable(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      warn!(status = %status, "Feed returned non-success status");
      return Err(FeedError::Http {
        feed: self.config.name.clone(),
        status: status.as_u16(),
      });
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| self.unavailable(format!("failed to read body: {e}")))?;

    let payload: Value = serde_json::from_slice(&body).map_err(|e| FeedError::Decode {
      feed: self.config.name.clone(),
      reason: e.to_string(),
    })?;

    info!(bytes = body.len(), "Feed payload fetched");
    Ok(payload)
  }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
  let mut map = HeaderMap::with_capacity(headers.len());
  for (name, value) in headers {
    let header_name = HeaderName::from_bytes(name.as_bytes())
      .with_context(|| format!("Invalid header name: {name}"))?;
    let header_value = HeaderValue::from_str(value)
      .with_context(|| format!("Invalid value for header {name}"))?;
    map.insert(header_name, header_value);
  }
  Ok(map)
}
