//! Pool List Source - Local Aggregation of DefiLlama Pools
//!
//! Reads the raw pool list and aggregates it into protocol quotes:
//! `apy = apyBase + apyReward`, sorted by APY descending. The
//! unfiltered set is the top N; a search is a case-insensitive
//! substring match on the project name.

use std::cmp::Ordering;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::domain::error::SourceError;
use crate::domain::quote::{NamedApy, ProtocolQuote};
use crate::ports::apy_source::ApySource;

use super::client::ApyClientConfig;
use super::types::{PoolEntry, PoolsResponse};

/// `ApySource` backed by a DefiLlama-compatible `/pools` endpoint.
pub struct PoolListSource {
  http: Client,
  /// Full URL of the pool list.
  pools_url: String,
  /// Size of the unfiltered result.
  top_n: usize,
  /// Dashboard labels resolved by `fetch_named_quotes`.
  labels: Vec<String>,
}

impl PoolListSource {
  /// Create a new pool list source.
  pub fn new(
    pools_url: impl Into<String>,
    top_n: usize,
    labels: Vec<String>,
    config: &ApyClientConfig,
  ) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      pools_url: pools_url.into(),
      top_n,
      labels,
    })
  }

  async fn fetch_pools(&self) -> Result<Vec<PoolEntry>, SourceError> {
    let response = self
      .http
      .get(&self.pools_url)
      .send()
      .await
      .map_err(|e| SourceError::unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      warn!(status = %status, "Pool list returned error status");
      return Err(SourceError::unavailable(format!("pool list error {status}")));
    }

    let body: PoolsResponse = response
      .json()
      .await
      .map_err(|e| SourceError::unavailable(format!("invalid pool list: {e}")))?;

    let pools = body.into_pools();
    debug!(pools = pools.len(), "Fetched pool list");
    Ok(pools)
  }
}

/// Turn pools into quotes sorted by APY descending.
///
/// Pools without a project are skipped. A non-empty `search` keeps only
/// projects containing it, ignoring case.
pub fn aggregate_pools(pools: &[PoolEntry], search: Option<&str>) -> Vec<ProtocolQuote> {
  let needle = search.map(str::to_lowercase).filter(|s| !s.is_empty());

  let mut quotes: Vec<ProtocolQuote> = pools
    .iter()
    .filter_map(|p| {
      let project = p.project.as_deref()?;
      if let Some(n) = &needle {
        if !project.to_lowercase().contains(n.as_str()) {
          return None;
        }
      }
      Some(ProtocolQuote::new(project, p.total_apy()))
    })
    .collect();

  quotes.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(Ordering::Equal));
  quotes
}

/// Project slug for a display label: lowercase, spaces become `-`.
fn label_slug(label: &str) -> String {
  label.trim().to_lowercase().replace(' ', "-")
}

/// Best APY per label among pools whose project slug matches it.
pub fn named_from_pools(pools: &[PoolEntry], labels: &[String]) -> NamedApy {
  labels
    .iter()
    .filter_map(|label| {
      let slug = label_slug(label);
      pools
        .iter()
        .filter(|p| p.project.as_deref().map(str::to_lowercase).as_deref() == Some(slug.as_str()))
        .map(PoolEntry::total_apy)
        .fold(None, |best: Option<f64>, apy| Some(best.map_or(apy, |b| b.max(apy))))
        .map(|apy| (label.clone(), apy))
    })
    .collect()
}

#[async_trait]
impl ApySource for PoolListSource {
  #[instrument(skip(self))]
  async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
    let pools = self.fetch_pools().await?;
    let mut quotes = aggregate_pools(&pools, search);

    if search.map_or(true, str::is_empty) {
      quotes.truncate(self.top_n);
    }

    Ok(quotes)
  }

  #[instrument(skip(self))]
  async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
    let pools = self.fetch_pools().await?;
    Ok(named_from_pools(&pools, &self.labels))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pool(project: Option<&str>, base: Option<f64>, reward: Option<f64>) -> PoolEntry {
    PoolEntry {
      pool: None,
      chain: Some("Ethereum".to_string()),
      project: project.map(str::to_string),
      symbol: None,
      tvl_usd: None,
      apy_base: base,
      apy_reward: reward,
    }
  }

  #[test]
  fn test_aggregate_sorts_descending_and_skips_unnamed() {
    let pools = vec![
      pool(Some("lido"), Some(3.0), None),
      pool(None, Some(99.0), None),
      pool(Some("aave-v3"), Some(4.0), Some(1.0)),
    ];
    let quotes = aggregate_pools(&pools, None);
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].name, "aave-v3");
    assert_eq!(quotes[0].apy, 5.0);
    assert_eq!(quotes[1].name, "lido");
  }

  #[test]
  fn test_search_is_case_insensitive_substring() {
    let pools = vec![
      pool(Some("aave-v3"), Some(4.0), None),
      pool(Some("Aave-v2"), Some(2.0), None),
      pool(Some("lido"), Some(3.0), None),
    ];
    let quotes = aggregate_pools(&pools, Some("AAVE"));
    let names: Vec<_> = quotes.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, vec!["aave-v3", "Aave-v2"]);
  }

  #[test]
  fn test_named_quotes_pick_best_pool_per_label() {
    let pools = vec![
      pool(Some("aave-v3"), Some(4.0), None),
      pool(Some("aave-v3"), Some(6.0), None),
      pool(Some("binance-staked-eth"), Some(2.5), None),
    ];
    let labels = vec!["Aave-V3".to_string(), "Binance Staked ETH".to_string(), "Nope".to_string()];
    let named = named_from_pools(&pools, &labels);
    assert_eq!(named["Aave-V3"], 6.0);
    assert_eq!(named["Binance Staked ETH"], 2.5);
    assert!(!named.contains_key("Nope"));
  }
}
