//! Local Key Wallet - `WalletConnector` Backed by a Private Key
//!
//! The connect flow reads the signing key from the environment,
//! builds a signer-bound provider, and hands back a link that can
//! bind the aggregator contract. The key is never logged.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::error::WalletError;
use crate::ports::aggregator::AggregatorGateway;
use crate::ports::wallet::{WalletConnector, WalletLink};

use super::contracts::{rpc_failure_reason, AggregatorContract, CONFIRMATION_TIMEOUT};
use super::provider::SignerProvider;
use super::validator::ContractValidator;

/// Environment variable holding the hex-encoded signing key.
pub const PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";

/// Connector that signs with a locally held private key.
pub struct LocalKeyConnector {
    /// JSON-RPC endpoint.
    rpc_url: String,
    /// Environment variable to read the key from.
    key_env: String,
    /// Receipt wait passed to every bound aggregator.
    confirmation_timeout: Duration,
}

impl LocalKeyConnector {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            key_env: PRIVATE_KEY_ENV.to_string(),
            confirmation_timeout: CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Read the key from a different environment variable.
    pub fn with_key_env(mut self, key_env: impl Into<String>) -> Self {
        self.key_env = key_env.into();
        self
    }

    fn load_signer(&self) -> Result<PrivateKeySigner, WalletError> {
        let raw = std::env::var(&self.key_env)
            .map_err(|_| WalletError::WalletUnavailable(format!("{} not set", self.key_env)))?;

        parse_signer(&raw)
    }
}

/// Parse a hex-encoded private key, with or without `0x`.
fn parse_signer(raw: &str) -> Result<PrivateKeySigner, WalletError> {
    PrivateKeySigner::from_str(raw.trim())
        .map_err(|e| WalletError::WalletUnavailable(format!("Invalid signing key: {e}")))
}

#[async_trait]
impl WalletConnector for LocalKeyConnector {
    #[instrument(skip(self), fields(rpc = %self.rpc_url))]
    async fn connect(&self) -> Result<Arc<dyn WalletLink>, WalletError> {
        let signer = self.load_signer()?;
        let provider = SignerProvider::connect(&self.rpc_url, signer)?;

        info!(signer = %provider.signer_address(), "Wallet provider acquired");
        Ok(Arc::new(LocalKeyLink {
            provider,
            confirmation_timeout: self.confirmation_timeout,
        }))
    }
}

/// Network-scoped link produced by [`LocalKeyConnector`].
pub struct LocalKeyLink {
    provider: SignerProvider,
    confirmation_timeout: Duration,
}

#[async_trait]
impl WalletLink for LocalKeyLink {
    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.provider
            .inner()
            .get_chain_id()
            .await
            .map_err(|e| WalletError::ConnectionRejected(rpc_failure_reason(&e)))
    }

    async fn signer_address(&self) -> Result<Address, WalletError> {
        Ok(self.provider.signer_address())
    }

    async fn bind_aggregator(
        &self,
        address: Address,
    ) -> Result<Arc<dyn AggregatorGateway>, WalletError> {
        let inner = self.provider.inner();

        ContractValidator::new(Arc::clone(&inner))
            .require_deployed("Aggregator", address)
            .await?;

        Ok(Arc::new(
            AggregatorContract::new(inner, address)
                .with_confirmation_timeout(self.confirmation_timeout),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_wallet_unavailable() {
        let connector = LocalKeyConnector::new("http://127.0.0.1:8545")
            .with_key_env("YIELD_ROUTER_TEST_KEY_THAT_IS_NEVER_SET");
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, WalletError::WalletUnavailable(_)));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_confirmation_timeout_defaults_and_overrides() {
        let connector = LocalKeyConnector::new("http://127.0.0.1:8545");
        assert_eq!(connector.confirmation_timeout, CONFIRMATION_TIMEOUT);

        let connector = connector.with_confirmation_timeout(Duration::from_secs(30));
        assert_eq!(connector.confirmation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_key_is_wallet_unavailable() {
        let err = parse_signer("not-a-key").err().unwrap();
        assert!(matches!(err, WalletError::WalletUnavailable(_)));
    }

    #[test]
    fn test_well_known_dev_key_parses() {
        // First default account of a local Hardhat/Anvil node.
        let signer = parse_signer(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80\n",
        )
        .unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }
}
