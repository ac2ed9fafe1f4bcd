//! APY Source Adapters
//!
//! HTTP implementations of the `ApySource` port.
//!
//! Sub-modules:
//! - `client`: Aggregating API client (`/protocols`, `/apy`)
//! - `pools`: Raw DefiLlama pool list, aggregated locally
//! - `types`: Wire format definitions

pub mod client;
pub mod pools;
pub mod types;

pub use client::{ApyClient, ApyClientConfig};
pub use pools::PoolListSource;
