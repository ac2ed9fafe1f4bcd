//! APY API Request/Response Types
//!
//! Serialization types for the aggregating APY endpoint and the raw
//! DefiLlama pool list. Unknown fields are ignored.

use serde::Deserialize;

use crate::domain::quote::ProtocolQuote;

/// One entry of `GET /protocols`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolEntry {
  /// Protocol name.
  pub name: String,
  /// APY in percent.
  #[serde(default)]
  pub apy: f64,
}

impl From<ProtocolEntry> for ProtocolQuote {
  fn from(entry: ProtocolEntry) -> Self {
    ProtocolQuote::new(entry.name, entry.apy)
  }
}

/// A value of `GET /apy`, either a bare number or `{ "value": n }`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ApyValue {
  Plain(f64),
  Wrapped { value: f64 },
}

impl ApyValue {
  pub fn value(self) -> f64 {
    match self {
      Self::Plain(v) | Self::Wrapped { value: v } => v,
    }
  }
}

/// One pool of the DefiLlama `/pools` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
  /// Pool identifier.
  #[serde(default)]
  pub pool: Option<String>,
  /// Chain name.
  #[serde(default)]
  pub chain: Option<String>,
  /// Project slug (e.g. `aave-v3`).
  #[serde(default)]
  pub project: Option<String>,
  /// Pool token symbol.
  #[serde(default)]
  pub symbol: Option<String>,
  /// Total value locked in USD.
  #[serde(default)]
  pub tvl_usd: Option<f64>,
  /// Base APY in percent.
  #[serde(default)]
  pub apy_base: Option<f64>,
  /// Reward APY in percent.
  #[serde(default)]
  pub apy_reward: Option<f64>,
}

impl PoolEntry {
  /// Base plus reward APY, missing parts counted as zero.
  pub fn total_apy(&self) -> f64 {
    self.apy_base.unwrap_or(0.0) + self.apy_reward.unwrap_or(0.0)
  }
}

/// Pool list body: either `{ "data": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PoolsResponse {
  Wrapped { data: Vec<PoolEntry> },
  Bare(Vec<PoolEntry>),
}

impl PoolsResponse {
  pub fn into_pools(self) -> Vec<PoolEntry> {
    match self {
      Self::Wrapped { data } | Self::Bare(data) => data,
    }
  }
}
