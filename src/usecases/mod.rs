//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the engine's workflows. Each use case owns its state and is the
//! only writer of it.
//!
//! Use cases:
//! - `ProtocolCatalog`: Debounced, generation-guarded search view
//! - `ComparisonView`: Concurrent per-protocol APY comparison
//! - `Dashboard`: Two fixed series with bounded history
//! - `Poller`: Start/stop lifecycle for periodic refreshes
//! - `WalletSession`: Wallet connect/disconnect state machine
//! - `DepositOrchestrator`: On-chain deposit lifecycle

pub mod catalog;
pub mod comparison;
pub mod dashboard;
pub mod deposit;
pub mod poller;
pub mod wallet_session;

pub use catalog::ProtocolCatalog;
pub use comparison::ComparisonView;
pub use dashboard::Dashboard;
pub use deposit::DepositOrchestrator;
pub use poller::{Poller, Refresh};
pub use wallet_session::{ConnectedWallet, WalletSession, WalletState};
