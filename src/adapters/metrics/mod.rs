//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export and health check endpoints
//! (/live, /ready) via axum 0.7, plus a counting decorator for any
//! APY source.

pub mod health;
pub mod metered;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use metered::MeteredSource;
pub use prometheus::MetricsRegistry;
