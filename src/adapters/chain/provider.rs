//! RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Builds the signer-bound provider used for all on-chain operations.
//! `ProviderBuilder::new().on_http()` returns a deeply nested filler
//! type, so the provider is stored type-erased as `dyn Provider`.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::signers::local::PrivateKeySigner;
use tracing::{info, instrument};

use crate::domain::error::WalletError;

/// Signer-bound JSON-RPC provider backed by alloy-rs.
///
/// Gas, nonce and chain id are filled by the recommended fillers; the
/// wallet filler signs every outgoing transaction with the local key.
pub struct SignerProvider {
    /// The alloy HTTP provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Address of the signing key.
    signer_address: Address,
}

impl SignerProvider {
    /// Build a provider for `rpc_url` that signs with `signer`.
    #[instrument(skip_all, fields(rpc = %rpc_url))]
    pub fn connect(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self, WalletError> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| WalletError::WalletUnavailable(format!("Invalid RPC URL {rpc_url}: {e}")))?;

        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        // alloy 0.9: on_http() is synchronous, returns impl Provider
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_client(RpcClient::new_http(url).boxed());

        // Wrap in Arc<dyn Provider> for type erasure
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        info!(signer = %signer_address, "Signer provider built");

        Ok(Self {
            provider,
            signer_address,
        })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
