//! Error taxonomy for the yield engine.
//!
//! Data-fetch errors are absorbed by the views that own them. Wallet and
//! deposit errors are surfaced to the user verbatim and leave the matching
//! state machine in `Failed`.

use thiserror::Error;

/// Failure fetching quotes from the APY source.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// Network error, timeout, non-2xx status or undecodable body.
    #[error("APY source unavailable: {detail}")]
    Unavailable { detail: String },
}

impl SourceError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            detail: detail.into(),
        }
    }
}

/// Failure connecting to the wallet.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WalletError {
    /// No usable wallet provider (missing key, bad endpoint).
    #[error("{0}")]
    WalletUnavailable(String),

    /// The provider refused or failed part of the handshake.
    #[error("{0}")]
    ConnectionRejected(String),

    /// A handshake is already running for this session.
    #[error("wallet connection already in progress")]
    AlreadyConnecting,

    /// The identity collaborator has not produced a session yet.
    #[error("user session not ready")]
    SessionNotReady,
}

/// Failure running a deposit.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DepositError {
    #[error("wallet not connected")]
    NotConnected,

    /// Another deposit ticket is still submitting or awaiting confirmation.
    #[error("a deposit is already in flight")]
    DepositInFlight,

    /// The protocol is not part of the current comparison list.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    /// The signer or node refused the transaction before it was mined.
    #[error("{}", detail_or(.reason, "transaction rejected"))]
    TransactionRejected { reason: Option<String> },

    /// The transaction was mined but reverted, or confirmation failed.
    #[error("{}", detail_or(.reason, "transaction reverted"))]
    TransactionReverted { reason: Option<String> },
}

fn detail_or<'a>(reason: &'a Option<String>, generic: &'a str) -> &'a str {
    match reason.as_deref() {
        Some(r) if !r.is_empty() => r,
        _ => generic,
    }
}
