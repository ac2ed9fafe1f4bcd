//! Chain Adapters - On-chain Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - Signer-bound RPC provider construction
//! - Aggregator contract deposits (`depositTo`, `depositHighest`)
//! - Deployed-code validation of the aggregator address
//! - The local-key `WalletConnector`

pub mod contracts;
pub mod provider;
pub mod validator;
pub mod wallet;

pub use contracts::AggregatorContract;
pub use provider::SignerProvider;
pub use validator::ContractValidator;
pub use wallet::{LocalKeyConnector, LocalKeyLink};
