//! Aggregator Contract Binding - Two-function Deposit ABI
//!
//! Implements the `AggregatorGateway` port over the signer-bound
//! provider. Calldata is ABI-encoded from the `sol!` interface and sent
//! as a raw transaction request with the stake attached as value.
//! Confirmation polls for the receipt until it is mined or times out.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::{decode_revert_reason, SolCall};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::domain::deposit::DepositTarget;
use crate::domain::error::DepositError;
use crate::ports::aggregator::{AggregatorGateway, DepositReceipt};

sol! {
    /// Deposit surface of the yield aggregator contract.
    interface IAggregator {
        function depositTo(uint256 index) external payable;
        function depositHighest() external payable;
    }
}

/// Default time to wait for a deposit to be mined.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Interval between receipt queries.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// ABI-encode the call for a deposit target.
pub fn encode_deposit(target: DepositTarget) -> Bytes {
    match target {
        DepositTarget::Index(index) => IAggregator::depositToCall {
            index: U256::from(index),
        }
        .abi_encode()
        .into(),
        DepositTarget::Highest => IAggregator::depositHighestCall {}.abi_encode().into(),
    }
}

/// Best human-readable reason for an RPC failure.
///
/// Prefers a decoded `Error(string)` revert, then the node's error
/// message, then the transport error text.
pub fn rpc_failure_reason(err: &RpcError<TransportErrorKind>) -> String {
    if let Some(payload) = err.as_error_resp() {
        if let Some(reason) = payload
            .as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
        {
            return reason;
        }
        return payload.message.to_string();
    }
    err.to_string()
}

/// Signer-bound aggregator contract handle.
pub struct AggregatorContract {
    /// Shared signer provider.
    provider: Arc<dyn Provider + Send + Sync>,
    /// Contract address from config.
    address: Address,
    /// Maximum wait for a receipt.
    confirmation_timeout: Duration,
}

impl AggregatorContract {
    /// Bind the aggregator at `address` to a signer provider.
    pub fn new(provider: Arc<dyn Provider + Send + Sync>, address: Address) -> Self {
        Self {
            provider,
            address,
            confirmation_timeout: CONFIRMATION_TIMEOUT,
        }
    }

    /// Override the receipt wait timeout.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

#[async_trait]
impl AggregatorGateway for AggregatorContract {
    fn address(&self) -> Address {
        self.address
    }

    #[instrument(skip(self), fields(aggregator = %self.address))]
    async fn submit(&self, target: DepositTarget, value: U256) -> Result<TxHash, DepositError> {
        let tx = TransactionRequest::default()
            .to(self.address)
            .value(value)
            .input(encode_deposit(target).into());

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| {
                let reason = rpc_failure_reason(&e);
                warn!(error = %e, reason = %reason, "Deposit submission failed");
                DepositError::TransactionRejected {
                    reason: Some(reason),
                }
            })?;

        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, target = %target, "Deposit transaction broadcast");
        Ok(tx_hash)
    }

    #[instrument(skip(self), fields(tx_hash = %tx_hash))]
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<DepositReceipt, DepositError> {
        let deadline = Instant::now() + self.confirmation_timeout;

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| DepositError::TransactionReverted {
                    reason: Some(rpc_failure_reason(&e)),
                })?;

            if let Some(receipt) = receipt {
                if !receipt.status() {
                    warn!("Deposit transaction reverted on-chain");
                    return Err(DepositError::TransactionReverted { reason: None });
                }

                return Ok(DepositReceipt {
                    tx_hash,
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used as u64,
                });
            }

            if Instant::now() >= deadline {
                return Err(DepositError::TransactionReverted {
                    reason: Some(format!(
                        "transaction {tx_hash} not mined within {}s",
                        self.confirmation_timeout.as_secs()
                    )),
                });
            }

            debug!("Receipt not available yet");
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
