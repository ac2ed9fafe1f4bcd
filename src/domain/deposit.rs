//! Deposit tickets and their lifecycle.
//!
//! A ticket tracks one on-chain deposit attempt from `Idle` to a terminal
//! `Confirmed` or `Failed` state. Tickets are ephemeral: the orchestrator
//! hands the terminal ticket back to the caller and keeps nothing.

use alloy::primitives::{TxHash, U256};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Which aggregator entry point a deposit goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositTarget {
    /// `depositTo(index)`, index in the aggregator's registration order.
    Index(u64),
    /// `depositHighest()`, the contract picks the best-yield protocol.
    Highest,
}

impl std::fmt::Display for DepositTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "index:{i}"),
            Self::Highest => write!(f, "highest"),
        }
    }
}

/// Lifecycle state of a deposit ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositState {
    Idle,
    Submitting,
    /// Submitted; waiting for the network to mine the transaction.
    AwaitingConfirmation { tx_hash: TxHash },
    Confirmed { tx_hash: TxHash },
    Failed { reason: String },
}

impl DepositState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Submitting | Self::AwaitingConfirmation { .. }
        )
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One deposit attempt.
#[derive(Debug, Clone)]
pub struct DepositTicket {
    pub id: Uuid,
    pub target: DepositTarget,
    /// Stake attached as transaction value, in wei.
    pub amount: U256,
    pub state: DepositState,
    pub created_at: DateTime<Utc>,
}

impl DepositTicket {
    pub fn new(target: DepositTarget, amount: U256) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            amount,
            state: DepositState::Idle,
            created_at: Utc::now(),
        }
    }

    /// Hash of the submitted transaction, once known.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match &self.state {
            DepositState::AwaitingConfirmation { tx_hash }
            | DepositState::Confirmed { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// State change broadcast to deposit observers.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositEvent {
    pub ticket_id: Uuid,
    pub target: DepositTarget,
    pub state: DepositState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_is_idle() {
        let t = DepositTicket::new(DepositTarget::Index(1), U256::from(10u64));
        assert_eq!(t.state, DepositState::Idle);
        assert!(t.tx_hash().is_none());
    }

    #[test]
    fn test_state_predicates() {
        let hash = TxHash::repeat_byte(0xab);
        assert!(DepositState::Submitting.is_in_flight());
        assert!(DepositState::AwaitingConfirmation { tx_hash: hash }.is_in_flight());
        assert!(DepositState::Confirmed { tx_hash: hash }.is_terminal());
        assert!(DepositState::Failed { reason: "x".into() }.is_terminal());
        assert!(!DepositState::Idle.is_terminal());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(DepositTarget::Index(2).to_string(), "index:2");
        assert_eq!(DepositTarget::Highest.to_string(), "highest");
    }
}
