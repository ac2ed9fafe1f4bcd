//! Deposit Orchestrator - On-chain Deposit Lifecycle
//!
//! Turns a user choice into one aggregator call with the fixed stake
//! attached, then follows it to a receipt:
//! - `Idle -> Submitting -> AwaitingConfirmation -> Confirmed`
//! - any failure ends in `Failed { reason }`, no retry
//! - one ticket in flight at a time
//! - every transition is broadcast as a `DepositEvent`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::U256;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::domain::deposit::{DepositEvent, DepositState, DepositTarget, DepositTicket};
use crate::domain::error::DepositError;
use crate::ports::wallet::WalletConnector;

use super::wallet_session::WalletSession;

/// Capacity of the deposit event channel.
const EVENT_CAPACITY: usize = 64;

/// Clears the in-flight flag when the deposit finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self(flag))
  }
}

impl Drop for InFlightGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// Runs deposits through the wallet session's aggregator handle.
pub struct DepositOrchestrator<C: WalletConnector> {
  wallet: Arc<WalletSession<C>>,
  /// Fixed stake per deposit, in wei.
  stake: U256,
  in_flight: AtomicBool,
  events: broadcast::Sender<DepositEvent>,
}

impl<C: WalletConnector> DepositOrchestrator<C> {
  pub fn new(wallet: Arc<WalletSession<C>>, stake: U256) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      wallet,
      stake,
      in_flight: AtomicBool::new(false),
      events,
    }
  }

  /// Deposit into the protocol at `index` of the aggregator.
  pub async fn deposit_to(&self, index: u64) -> Result<DepositTicket, DepositError> {
    self.execute(DepositTarget::Index(index)).await
  }

  /// Deposit into `name`, resolved against the comparison list as it is
  /// right now.
  pub async fn deposit_to_protocol(
    &self,
    name: &str,
    comparison: &[String],
  ) -> Result<DepositTicket, DepositError> {
    let index = comparison
      .iter()
      .position(|n| n == name)
      .ok_or_else(|| DepositError::UnknownProtocol(name.to_string()))?;
    self.execute(DepositTarget::Index(index as u64)).await
  }

  /// Let the aggregator route the stake to its best-yield protocol.
  pub async fn deposit_highest(&self) -> Result<DepositTicket, DepositError> {
    self.execute(DepositTarget::Highest).await
  }

  #[instrument(skip_all, fields(target = %target, stake = %self.stake))]
  async fn execute(&self, target: DepositTarget) -> Result<DepositTicket, DepositError> {
    let Some(aggregator) = self.wallet.aggregator().await else {
      warn!("Deposit refused, wallet not connected");
      return Err(DepositError::NotConnected);
    };

    let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
      debug!("Deposit refused, another one is in flight");
      return Err(DepositError::DepositInFlight);
    };

    let mut ticket = DepositTicket::new(target, self.stake);
    self.transition(&mut ticket, DepositState::Submitting);

    let tx_hash = match aggregator.submit(target, self.stake).await {
      Ok(hash) => hash,
      Err(e) => return Err(self.fail(&mut ticket, e)),
    };
    self.transition(&mut ticket, DepositState::AwaitingConfirmation { tx_hash });

    match aggregator.wait_for_confirmation(tx_hash).await {
      Ok(receipt) => {
        info!(
          ticket = %ticket.id,
          tx_hash = %receipt.tx_hash,
          block = ?receipt.block_number,
          gas_used = receipt.gas_used,
          "Deposit confirmed"
        );
        self.transition(&mut ticket, DepositState::Confirmed { tx_hash });
        Ok(ticket)
      }
      Err(e) => Err(self.fail(&mut ticket, e)),
    }
  }

  fn fail(&self, ticket: &mut DepositTicket, error: DepositError) -> DepositError {
    let reason = error.to_string();
    warn!(ticket = %ticket.id, reason = %reason, "Deposit failed");
    self.transition(ticket, DepositState::Failed { reason });
    error
  }

  fn transition(&self, ticket: &mut DepositTicket, state: DepositState) {
    debug!(ticket = %ticket.id, from = ticket.state.label(), to = state.label(), "Deposit transition");
    ticket.state = state;
    // No receivers is fine.
    let _ = self.events.send(DepositEvent {
      ticket_id: ticket.id,
      target: ticket.target,
      state: ticket.state.clone(),
    });
  }

  /// Receiver for every deposit state transition.
  pub fn subscribe(&self) -> broadcast::Receiver<DepositEvent> {
    self.events.subscribe()
  }

  pub fn is_in_flight(&self) -> bool {
    self.in_flight.load(Ordering::Acquire)
  }

  pub fn stake(&self) -> U256 {
    self.stake
  }
}
