//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, blockchain RPC, identity).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: APY data endpoints (protocol list, named APY, pool list)
//! - `chain`: Signer provider and aggregator contract via alloy-rs
//! - `identity`: Environment-driven identity gate
//! - `metrics`: Prometheus metrics export and health checks

pub mod api;
pub mod chain;
pub mod identity;
pub mod metrics;
