//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets
//! (the wallet private key) come only from the environment.
//! The aggregator address and data endpoints are externalized
//! here - nothing is hardcoded in the domain layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any component starts.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Process identity and logging.
  pub app: AppSection,
  /// APY data source.
  pub source: SourceConfig,
  /// Polling and debounce timing.
  #[serde(default)]
  pub polling: PollingConfig,
  /// Chain and aggregator contract.
  pub chain: ChainConfig,
  /// Deposit parameters.
  #[serde(default)]
  pub deposit: DepositConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// User session gating for wallet connects.
  #[serde(default)]
  pub identity: IdentityConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Which APY source adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  /// Aggregating HTTP API (`/protocols`, `/apy`).
  Api,
  /// Raw DefiLlama-style pool list, aggregated locally.
  Pools,
}

/// APY source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  /// Adapter selection.
  #[serde(default = "default_source_kind")]
  pub kind: SourceKind,
  /// Base URL of the aggregating API (e.g. `http://localhost:8080/api`).
  pub base_url: String,
  /// Pool list URL used by the `pools` adapter.
  #[serde(default = "default_pools_url")]
  pub pools_url: String,
  /// Number of quotes in an unfiltered fetch.
  #[serde(default = "default_top_n")]
  pub top_n: usize,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Label of the first dashboard series.
  #[serde(default = "default_label_a")]
  pub label_a: String,
  /// Label of the second dashboard series.
  #[serde(default = "default_label_b")]
  pub label_b: String,
}

/// Polling and debounce timing.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
  /// Comparison and catalog refresh interval (milliseconds).
  #[serde(default = "default_comparison_interval")]
  pub comparison_interval_ms: u64,
  /// Dashboard refresh interval (milliseconds).
  #[serde(default = "default_dashboard_interval")]
  pub dashboard_interval_ms: u64,
  /// Search debounce quiet period (milliseconds).
  #[serde(default = "default_debounce")]
  pub search_debounce_ms: u64,
}

/// Chain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// Aggregator contract address (checksummed or lowercase hex).
  pub aggregator_address: String,
}

/// Deposit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositConfig {
  /// Fixed stake attached to every deposit, in ether.
  #[serde(default = "default_stake_eth")]
  pub stake_eth: String,
  /// How long to wait for a deposit receipt before giving up.
  #[serde(default = "default_confirmation_timeout")]
  pub confirmation_timeout_secs: u64,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

/// Identity gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
  /// Refuse wallet connects until a session token is present.
  #[serde(default)]
  pub require_session: bool,
  /// Environment variable carrying the identity provider's session token.
  #[serde(default = "default_token_env")]
  pub token_env: String,
}

impl PollingConfig {
  pub fn comparison_interval(&self) -> Duration {
    Duration::from_millis(self.comparison_interval_ms)
  }

  pub fn dashboard_interval(&self) -> Duration {
    Duration::from_millis(self.dashboard_interval_ms)
  }

  pub fn search_debounce(&self) -> Duration {
    Duration::from_millis(self.search_debounce_ms)
  }
}

impl Default for PollingConfig {
  fn default() -> Self {
    Self {
      comparison_interval_ms: default_comparison_interval(),
      dashboard_interval_ms: default_dashboard_interval(),
      search_debounce_ms: default_debounce(),
    }
  }
}

impl DepositConfig {
  pub fn confirmation_timeout(&self) -> Duration {
    Duration::from_secs(self.confirmation_timeout_secs)
  }
}

impl Default for DepositConfig {
  fn default() -> Self {
    Self {
      stake_eth: default_stake_eth(),
      confirmation_timeout_secs: default_confirmation_timeout(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

impl Default for IdentityConfig {
  fn default() -> Self {
    Self {
      require_session: false,
      token_env: default_token_env(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_confirmation_timeout() -> u64 {
  180
}

fn default_true() -> bool {
  true
}

fn default_source_kind() -> SourceKind {
  SourceKind::Api
}

fn default_pools_url() -> String {
  "https://yields.llama.fi/pools".to_string()
}

fn default_top_n() -> usize {
  5
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_label_a() -> String {
  "Aave-V3".to_string()
}

fn default_label_b() -> String {
  "Binance Staked ETH".to_string()
}

fn default_comparison_interval() -> u64 {
  30_000
}

fn default_dashboard_interval() -> u64 {
  5_000
}

fn default_debounce() -> u64 {
  300
}

fn default_stake_eth() -> String {
  "0.01".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

fn default_token_env() -> String {
  "YIELD_ROUTER_SESSION_TOKEN".to_string()
}
