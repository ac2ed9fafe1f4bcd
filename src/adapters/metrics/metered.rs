//! Metered APY Source - Counting Decorator
//!
//! Wraps any `ApySource`, counts requests and failures in the
//! Prometheus registry and mirrors the outcome into the readiness
//! state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::SourceError;
use crate::domain::quote::{NamedApy, ProtocolQuote};
use crate::ports::apy_source::ApySource;

use super::health::HealthState;
use super::prometheus::MetricsRegistry;

pub struct MeteredSource<S: ApySource> {
    inner: S,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
}

impl<S: ApySource> MeteredSource<S> {
    pub fn new(inner: S, metrics: Arc<MetricsRegistry>, health: Arc<HealthState>) -> Self {
        Self {
            inner,
            metrics,
            health,
        }
    }

    fn observe<T>(&self, kind: &str, result: &Result<T, SourceError>) {
        self.metrics.source_fetches.with_label_values(&[kind]).inc();
        if result.is_err() {
            self.metrics.source_failures.with_label_values(&[kind]).inc();
        }
        self.health.set_source_healthy(result.is_ok());
    }
}

#[async_trait]
impl<S: ApySource> ApySource for MeteredSource<S> {
    async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
        let result = self.inner.fetch_quotes(search).await;
        self.observe("quotes", &result);
        result
    }

    async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
        let result = self.inner.fetch_named_quotes().await;
        self.observe("named", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Down;

    #[async_trait]
    impl ApySource for Down {
        async fn fetch_quotes(&self, _search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
            Err(SourceError::unavailable("503"))
        }

        async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
            Ok(NamedApy::new())
        }
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_flip_readiness() {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let health = Arc::new(HealthState::new());
        let source = MeteredSource::new(Down, Arc::clone(&metrics), Arc::clone(&health));

        assert!(source.fetch_quotes(None).await.is_err());
        assert!(!health.is_ready());
        assert_eq!(metrics.source_failures.with_label_values(&["quotes"]).get(), 1);

        source.fetch_named_quotes().await.unwrap();
        assert!(health.is_ready());
        assert_eq!(metrics.source_fetches.with_label_values(&["named"]).get(), 1);
        assert_eq!(metrics.source_failures.with_label_values(&["named"]).get(), 0);
    }
}
