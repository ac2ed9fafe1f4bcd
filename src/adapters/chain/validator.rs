//! Contract Validator — On-chain Verification at Bind Time
//!
//! Checks that the configured aggregator address points to deployed
//! code (not an EOA or a typo) before a deposit handle is bound to it.

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::Provider;
use tracing::{info, instrument, warn};

use crate::domain::error::WalletError;

/// Result of validating a single contract.
#[derive(Debug)]
pub struct ValidationResult {
    /// Contract name for logging.
    pub name: String,
    /// Address that was validated.
    pub address: Address,
    /// Whether the contract has deployed code.
    pub has_code: bool,
}

/// Validates contract addresses against on-chain state.
pub struct ContractValidator {
    /// Alloy provider for on-chain queries.
    provider: Arc<dyn Provider + Send + Sync>,
}

impl ContractValidator {
    /// Create a new validator with the given provider.
    pub fn new(provider: Arc<dyn Provider + Send + Sync>) -> Self {
        Self { provider }
    }

    /// Query whether code exists at `address`.
    #[instrument(skip(self))]
    pub async fn validate_contract(
        &self,
        name: &str,
        address: Address,
    ) -> Result<ValidationResult, WalletError> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| WalletError::ConnectionRejected(e.to_string()))?;

        let has_code = !code.is_empty();

        if has_code {
            info!(contract = name, address = %address, "Contract validated: code exists on-chain");
        } else {
            warn!(contract = name, address = %address, "Contract has no code — possible misconfiguration");
        }

        Ok(ValidationResult {
            name: name.to_string(),
            address,
            has_code,
        })
    }

    /// Fail unless `address` holds deployed code.
    pub async fn require_deployed(&self, name: &str, address: Address) -> Result<(), WalletError> {
        let result = self.validate_contract(name, address).await?;
        if !result.has_code {
            return Err(WalletError::ConnectionRejected(format!(
                "{name} at {address} has no deployed code"
            )));
        }
        Ok(())
    }
}
