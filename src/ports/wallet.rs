//! Wallet Port - Wallet Provider Handshake Interface
//!
//! A connector acquires a network-scoped link to the user's wallet.
//! The link exposes the chain, the signer address, and binds the
//! aggregator contract to the signer.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::domain::error::WalletError;

use super::aggregator::AggregatorGateway;

/// Entry point to an installed wallet provider.
#[async_trait]
pub trait WalletConnector: Send + Sync + 'static {
  /// Run the provider's connect / request-accounts flow.
  async fn connect(&self) -> Result<Arc<dyn WalletLink>, WalletError>;
}

/// A connected, network-scoped wallet.
#[async_trait]
pub trait WalletLink: Send + Sync {
  /// Chain identifier of the network the wallet is on.
  async fn chain_id(&self) -> Result<u64, WalletError>;

  /// Address of the transaction signer.
  async fn signer_address(&self) -> Result<Address, WalletError>;

  /// Bind the aggregator contract at `address` to this wallet's signer.
  async fn bind_aggregator(
    &self,
    address: Address,
  ) -> Result<Arc<dyn AggregatorGateway>, WalletError>;
}
