//! APY HTTP Client - Aggregating Yield API Client
//!
//! Wraps reqwest with a request timeout for the `/protocols` and `/apy`
//! endpoints. Every call is a single round-trip: failures map to
//! `SourceError::Unavailable` and are retried only by the next poll.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::domain::error::SourceError;
use crate::domain::quote::{NamedApy, ProtocolQuote};
use crate::ports::apy_source::ApySource;

use super::types::{ApyValue, ProtocolEntry};

/// Configuration for the APY HTTP client.
#[derive(Debug, Clone)]
pub struct ApyClientConfig {
  /// Base URL for the API, without trailing slash.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
}

impl Default for ApyClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/api".to_string(),
      timeout: Duration::from_secs(10),
    }
  }
}

/// HTTP client for the aggregating APY API.
pub struct ApyClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ApyClientConfig,
}

impl ApyClient {
  /// Create a new APY client.
  pub fn new(mut config: ApyClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    config.base_url = config.base_url.trim_end_matches('/').to_string();

    Ok(Self { http, config })
  }

  /// GET `path` with optional query pairs and decode the JSON body.
  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<T, SourceError> {
    let url = format!("{}{}", self.config.base_url, path);

    let response = self
      .http
      .get(&url)
      .query(query)
      .send()
      .await
      .map_err(|e| {
        warn!(error = %e, path, "APY request failed");
        SourceError::unavailable(e.to_string())
      })?;

    let response = Self::ensure_success(response).await?;

    response
      .json::<T>()
      .await
      .map_err(|e| SourceError::unavailable(format!("invalid response body: {e}")))
  }

  /// Map a non-2xx status to `SourceError::Unavailable`.
  async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, "APY API returned error status");
    Err(SourceError::unavailable(format!("API error {status}: {body}")))
  }
}

#[async_trait]
impl ApySource for ApyClient {
  #[instrument(skip(self))]
  async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
    let query: Vec<(&str, &str)> = match search {
      Some(term) if !term.is_empty() => vec![("search", term)],
      _ => Vec::new(),
    };

    let entries: Vec<ProtocolEntry> = self.get_json("/protocols", &query).await?;
    debug!(count = entries.len(), "Fetched protocol quotes");

    Ok(entries.into_iter().map(ProtocolQuote::from).collect())
  }

  #[instrument(skip(self))]
  async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
    let raw: HashMap<String, ApyValue> = self.get_json("/apy", &[]).await?;
    debug!(labels = raw.len(), "Fetched named APYs");

    Ok(
      raw
        .into_iter()
        .map(|(label, value)| (label, value.value()))
        .collect(),
    )
  }
}
