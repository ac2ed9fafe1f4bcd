//! Wallet Session Use Case - Connect/Disconnect Lifecycle
//!
//! Owns the wallet state machine and the signer-bound aggregator handle.
//!
//! `Disconnected -> Connecting -> Connected | Failed`, and `Failed ->
//! Connecting` on retry. Only one provider handshake runs at a time:
//! connects are rejected while one is unresolved, even if the session
//! was reset in the meantime. Each connect carries an attempt id that
//! `disconnect` invalidates, so a superseded handshake never installs
//! its link. The local-chain advisory is kept apart from the
//! connection state and never overwrites it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::domain::error::WalletError;
use crate::ports::aggregator::AggregatorGateway;
use crate::ports::identity::{IdentityGate, OpenGate, SessionStatus};
use crate::ports::wallet::WalletConnector;

/// Chain id of a local Hardhat/Anvil development node.
pub const LOCAL_DEV_CHAIN_ID: u64 = 31337;

/// Advisory raised when connected to the local development chain.
pub const LOCAL_CHAIN_ADVISORY: &str = "name resolution unsupported on this network";

/// A live wallet connection.
#[derive(Clone)]
pub struct ConnectedWallet {
  pub address: Address,
  pub chain_id: u64,
  /// Signer-bound aggregator handle.
  pub aggregator: Arc<dyn AggregatorGateway>,
}

impl fmt::Debug for ConnectedWallet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConnectedWallet")
      .field("address", &self.address)
      .field("chain_id", &self.chain_id)
      .field("aggregator", &self.aggregator.address())
      .finish()
  }
}

/// Wallet connection state.
#[derive(Debug, Clone, Default)]
pub enum WalletState {
  #[default]
  Disconnected,
  Connecting,
  Connected(ConnectedWallet),
  Failed {
    reason: String,
  },
}

impl WalletState {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Disconnected => "disconnected",
      Self::Connecting => "connecting",
      Self::Connected(_) => "connected",
      Self::Failed { .. } => "failed",
    }
  }
}

/// One wallet session per client instance.
pub struct WalletSession<C: WalletConnector> {
  connector: Arc<C>,
  identity: Arc<dyn IdentityGate>,
  /// Fixed aggregator address bound on every connect.
  aggregator_address: Address,
  state: RwLock<WalletState>,
  advisory: RwLock<Option<String>>,
  /// Held for the whole provider handshake.
  handshake_lock: Mutex<()>,
  /// Bumped by every connect and disconnect.
  attempt: AtomicU64,
}

impl<C: WalletConnector> WalletSession<C> {
  /// Create a disconnected session with an always-open identity gate.
  pub fn new(connector: Arc<C>, aggregator_address: Address) -> Self {
    Self {
      connector,
      identity: Arc::new(OpenGate),
      aggregator_address,
      state: RwLock::new(WalletState::Disconnected),
      advisory: RwLock::new(None),
      handshake_lock: Mutex::new(()),
      attempt: AtomicU64::new(0),
    }
  }

  /// Gate `connect()` on an identity collaborator.
  pub fn with_identity(mut self, identity: Arc<dyn IdentityGate>) -> Self {
    self.identity = identity;
    self
  }

  /// Connect the wallet and bind the aggregator.
  ///
  /// Returns the existing wallet if already connected. Any handshake
  /// failure moves the session to `Failed` with the error text verbatim.
  #[instrument(skip(self), fields(aggregator = %self.aggregator_address))]
  pub async fn connect(&self) -> Result<ConnectedWallet, WalletError> {
    let status = self.identity.session_status();
    if status != SessionStatus::Authenticated {
      warn!(status = ?status, "Wallet connect refused, no user session");
      return Err(WalletError::SessionNotReady);
    }

    let Ok(_handshake) = self.handshake_lock.try_lock() else {
      return Err(WalletError::AlreadyConnecting);
    };

    let attempt = {
      let mut state = self.state.write().await;
      match &*state {
        WalletState::Connecting => return Err(WalletError::AlreadyConnecting),
        WalletState::Connected(wallet) => return Ok(wallet.clone()),
        WalletState::Disconnected | WalletState::Failed { .. } => {}
      }
      *state = WalletState::Connecting;
      self.attempt.fetch_add(1, Ordering::SeqCst) + 1
    };

    let mut observed_chain = None;
    let result = self.handshake(&mut observed_chain).await;

    let mut state = self.state.write().await;
    if self.attempt.load(Ordering::SeqCst) != attempt {
      warn!(attempt, "Session reset during handshake, discarding connection");
      return Err(WalletError::ConnectionRejected(
        "wallet disconnected during connection".to_string(),
      ));
    }

    if let Some(chain_id) = observed_chain {
      *self.advisory.write().await = if chain_id == LOCAL_DEV_CHAIN_ID {
        warn!(chain_id, advisory = LOCAL_CHAIN_ADVISORY, "Connected to local development chain");
        Some(LOCAL_CHAIN_ADVISORY.to_string())
      } else {
        None
      };
    }

    match result {
      Ok(wallet) => {
        info!(address = %wallet.address, chain_id = wallet.chain_id, "Wallet connected");
        *state = WalletState::Connected(wallet.clone());
        Ok(wallet)
      }
      Err(e) => {
        warn!(error = %e, "Wallet connection failed");
        *state = WalletState::Failed {
          reason: e.to_string(),
        };
        Err(e)
      }
    }
  }

  /// Provider handshake. `observed_chain` is set as soon as the chain id
  /// is known, even if a later step fails.
  async fn handshake(
    &self,
    observed_chain: &mut Option<u64>,
  ) -> Result<ConnectedWallet, WalletError> {
    let link = self.connector.connect().await?;

    let chain_id = link.chain_id().await?;
    *observed_chain = Some(chain_id);

    let address = link.signer_address().await?;
    let aggregator = link.bind_aggregator(self.aggregator_address).await?;

    Ok(ConnectedWallet {
      address,
      chain_id,
      aggregator,
    })
  }

  /// Drop the connection, e.g. on a provider account or chain change.
  ///
  /// A handshake still running is invalidated and its result dropped.
  pub async fn disconnect(&self) {
    let mut state = self.state.write().await;
    self.attempt.fetch_add(1, Ordering::SeqCst);
    if !matches!(*state, WalletState::Disconnected) {
      info!(from = state.label(), "Wallet disconnected");
    }
    *state = WalletState::Disconnected;
  }

  pub async fn state(&self) -> WalletState {
    self.state.read().await.clone()
  }

  pub async fn is_connected(&self) -> bool {
    matches!(*self.state.read().await, WalletState::Connected(_))
  }

  /// Aggregator handle of the connected wallet.
  pub async fn aggregator(&self) -> Option<Arc<dyn AggregatorGateway>> {
    match &*self.state.read().await {
      WalletState::Connected(wallet) => Some(Arc::clone(&wallet.aggregator)),
      _ => None,
    }
  }

  /// Non-fatal network advisory, independent of the connection state.
  pub async fn advisory(&self) -> Option<String> {
    self.advisory.read().await.clone()
  }

  pub fn aggregator_address(&self) -> Address {
    self.aggregator_address
  }
}
