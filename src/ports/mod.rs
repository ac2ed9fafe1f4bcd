//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ApySource`: Yield quotes from the external data endpoint
//! - `WalletConnector` / `WalletLink`: Wallet provider handshake
//! - `AggregatorGateway`: Signer-bound aggregator contract calls
//! - `IdentityGate`: Delegated user session status

pub mod aggregator;
pub mod apy_source;
pub mod identity;
pub mod wallet;
