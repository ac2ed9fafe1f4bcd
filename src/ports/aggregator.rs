//! Aggregator Port - On-chain Deposit Interface
//!
//! The aggregator contract is an opaque collaborator exposing exactly two
//! payable entry points: `depositTo(uint256)` and `depositHighest()`.
//! Submission and confirmation are separate calls so the orchestrator can
//! track the ticket between them.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::domain::deposit::DepositTarget;
use crate::domain::error::DepositError;

/// Summary of a mined deposit transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositReceipt {
  /// Transaction hash.
  pub tx_hash: TxHash,
  /// Block the transaction was mined in, if reported.
  pub block_number: Option<u64>,
  /// Gas consumed by the transaction.
  pub gas_used: u64,
}

/// Signer-bound handle on the aggregator contract.
#[async_trait]
pub trait AggregatorGateway: Send + Sync + 'static {
  /// Aggregator contract address.
  fn address(&self) -> Address;

  /// Sign and broadcast a deposit with `value` wei attached.
  ///
  /// # Errors
  /// `TransactionRejected` if the signer or node refuses the transaction.
  async fn submit(&self, target: DepositTarget, value: U256) -> Result<TxHash, DepositError>;

  /// Wait until the transaction is mined.
  ///
  /// # Errors
  /// `TransactionReverted` if the receipt reports failure or the
  /// confirmation could not be observed.
  async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<DepositReceipt, DepositError>;
}
