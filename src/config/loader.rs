//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use alloy::primitives::{utils::parse_ether, Address, U256};
use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
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

  let config = parse_config(&content)?;

  info!(
    name = %config.app.name,
    source = ?config.source.kind,
    rpc = %config.chain.rpc_url,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Parse the configured aggregator address.
pub fn aggregator_address(config: &AppConfig) -> Result<Address> {
  config
    .chain
    .aggregator_address
    .parse()
    .with_context(|| format!("Invalid aggregator address: {}", config.chain.aggregator_address))
}

/// Parse the configured stake into wei.
pub fn stake_wei(config: &AppConfig) -> Result<U256> {
  parse_ether(&config.deposit.stake_eth)
    .with_context(|| format!("Invalid stake amount: {}", config.deposit.stake_eth))
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Source validation
  anyhow::ensure!(
    !config.source.base_url.is_empty(),
    "source.base_url must not be empty"
  );
  anyhow::ensure!(
    config.source.top_n > 0,
    "source.top_n must be positive"
  );
  anyhow::ensure!(
    config.source.timeout_ms > 0,
    "source.timeout_ms must be positive"
  );
  anyhow::ensure!(
    config.source.label_a != config.source.label_b,
    "source.label_a and source.label_b must differ, both are {}",
    config.source.label_a
  );

  // Polling validation
  anyhow::ensure!(
    config.polling.comparison_interval_ms > 0 && config.polling.dashboard_interval_ms > 0,
    "Polling intervals must be positive"
  );

  // Chain validation
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "chain.rpc_url must not be empty"
  );
  aggregator_address(config)?;

  // Deposit validation
  let stake = stake_wei(config)?;
  anyhow::ensure!(stake > U256::ZERO, "deposit.stake_eth must be positive");
  anyhow::ensure!(
    config.deposit.confirmation_timeout_secs > 0,
    "deposit.confirmation_timeout_secs must be positive"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SourceKind;

  const MINIMAL: &str = r#"
    [app]
    name = "yield-router"

    [source]
    base_url = "http://localhost:8080/api"

    [chain]
    rpc_url = "http://localhost:8545"
    aggregator_address = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_defaults() {
    let config = parse_config(MINIMAL).unwrap();
    assert_eq!(config.source.kind, SourceKind::Api);
    assert_eq!(config.source.top_n, 5);
    assert_eq!(config.polling.search_debounce_ms, 300);
    assert_eq!(config.polling.comparison_interval_ms, 30_000);
    assert_eq!(config.polling.dashboard_interval_ms, 5_000);
    assert_eq!(config.source.label_a, "Aave-V3");
    assert_eq!(config.deposit.confirmation_timeout(), std::time::Duration::from_secs(180));
    assert_eq!(
      stake_wei(&config).unwrap(),
      U256::from(10_000_000_000_000_000u64)
    );
  }

  #[test]
  fn test_rejects_bad_aggregator_address() {
    let bad = MINIMAL.replace("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0", "0x1234");
    assert!(parse_config(&bad).is_err());
  }

  #[test]
  fn test_rejects_zero_confirmation_timeout() {
    let zero = format!("{MINIMAL}\n[deposit]\nconfirmation_timeout_secs = 0\n");
    assert!(parse_config(&zero).is_err());
  }

  #[test]
  fn test_rejects_zero_stake() {
    let zero = format!("{MINIMAL}\n[deposit]\nstake_eth = \"0\"\n");
    assert!(parse_config(&zero).is_err());
  }
}
