//! Dashboard Use Case - Two Fixed Series with History
//!
//! Polls the named-quotes endpoint, keeps the current pair for the two
//! configured labels and appends one history sample per successful
//! refresh. The current pair is also published on a watch channel.
//! Overlapping refreshes are sequenced by generation: a result older
//! than the last applied one is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tracing::{debug, instrument, warn};

use crate::domain::error::SourceError;
use crate::domain::history::{HistoryBuffer, HistorySample};
use crate::domain::quote::{DualApy, Series};
use crate::ports::apy_source::ApySource;

use super::poller::Refresh;

#[derive(Debug, Default)]
struct DashboardState {
  current: Option<DualApy>,
  history: HistoryBuffer,
  last_error: Option<String>,
  /// Generation of the last refresh that landed.
  applied: u64,
}

/// Dual-series APY dashboard.
pub struct Dashboard<S: ApySource> {
  source: Arc<S>,
  label_a: String,
  label_b: String,
  state: RwLock<DashboardState>,
  updates: watch::Sender<Option<DualApy>>,
  generation: AtomicU64,
}

impl<S: ApySource> Dashboard<S> {
  pub fn new(source: Arc<S>, label_a: impl Into<String>, label_b: impl Into<String>) -> Self {
    let (updates, _) = watch::channel(None);
    Self {
      source,
      label_a: label_a.into(),
      label_b: label_b.into(),
      state: RwLock::new(DashboardState::default()),
      updates,
      generation: AtomicU64::new(0),
    }
  }

  /// Fetch the named quotes and record a sample.
  ///
  /// Returns `Ok(None)` when a newer refresh already landed; the
  /// superseded result (or error) is dropped.
  #[instrument(skip(self), fields(a = %self.label_a, b = %self.label_b))]
  pub async fn refresh(&self) -> Result<Option<DualApy>, SourceError> {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let result = self.source.fetch_named_quotes().await;

    let mut state = self.state.write().await;
    if generation <= state.applied {
      debug!(generation, applied = state.applied, "Discarding stale dashboard refresh");
      return Ok(None);
    }
    state.applied = generation;

    let named = match result {
      Ok(named) => named,
      Err(e) => {
        warn!(error = %e, "Dashboard refresh failed, keeping previous values");
        state.last_error = Some(e.to_string());
        return Err(e);
      }
    };

    let apy = DualApy::from_named(&named, &self.label_a, &self.label_b);
    state.current = Some(apy);
    state.history.append(HistorySample::now(apy));
    state.last_error = None;
    debug!(series_a = apy.a, series_b = apy.b, samples = state.history.len(), "Dashboard updated");
    self.updates.send_replace(Some(apy));
    Ok(Some(apy))
  }

  pub async fn current(&self) -> Option<DualApy> {
    self.state.read().await.current
  }

  /// Label and APY of the higher series. Series A wins ties.
  pub async fn best(&self) -> Option<(&str, f64)> {
    let current = self.state.read().await.current?;
    let (series, apy) = current.best();
    Some((self.label(series), apy))
  }

  pub fn label(&self, series: Series) -> &str {
    match series {
      Series::A => &self.label_a,
      Series::B => &self.label_b,
    }
  }

  /// History window, oldest first.
  pub async fn history(&self) -> Vec<HistorySample> {
    self.state.read().await.history.snapshot()
  }

  pub async fn last_error(&self) -> Option<String> {
    self.state.read().await.last_error.clone()
  }

  /// Receiver for every new pair.
  pub fn subscribe(&self) -> watch::Receiver<Option<DualApy>> {
    self.updates.subscribe()
  }
}

#[async_trait]
impl<S: ApySource> Refresh for Dashboard<S> {
  fn name(&self) -> &'static str {
    "dashboard"
  }

  async fn refresh(&self) {
    let _ = Dashboard::refresh(self).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::history::HISTORY_CAPACITY;
  use crate::domain::quote::{NamedApy, ProtocolQuote};

  struct NamedSource(NamedApy);

  #[async_trait]
  impl ApySource for NamedSource {
    async fn fetch_quotes(&self, _search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
      Ok(Vec::new())
    }

    async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
      Ok(self.0.clone())
    }
  }

  fn dashboard(pairs: &[(&str, f64)]) -> Dashboard<NamedSource> {
    let named = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    Dashboard::new(Arc::new(NamedSource(named)), "Aave-V3", "Binance Staked ETH")
  }

  #[tokio::test]
  async fn test_missing_label_reads_zero() {
    let d = dashboard(&[("Aave-V3", 4.2)]);
    let apy = d.refresh().await.unwrap();
    assert_eq!(apy, Some(DualApy { a: 4.2, b: 0.0 }));
    assert_eq!(d.best().await, Some(("Aave-V3", 4.2)));
  }

  #[tokio::test]
  async fn test_best_prefers_a_on_tie() {
    let d = dashboard(&[("Aave-V3", 3.0), ("Binance Staked ETH", 3.0)]);
    d.refresh().await.unwrap();
    assert_eq!(d.best().await, Some(("Aave-V3", 3.0)));
  }

  #[tokio::test]
  async fn test_history_is_bounded() {
    let d = dashboard(&[("Aave-V3", 1.0), ("Binance Staked ETH", 2.0)]);
    for _ in 0..30 {
      d.refresh().await.unwrap();
    }
    let history = d.history().await;
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
  }

  #[tokio::test]
  async fn test_subscribers_see_latest_pair() {
    let d = dashboard(&[("Binance Staked ETH", 5.0)]);
    let rx = d.subscribe();
    d.refresh().await.unwrap();
    assert_eq!(*rx.borrow(), Some(DualApy { a: 0.0, b: 5.0 }));
    assert_eq!(d.best().await, Some(("Binance Staked ETH", 5.0)));
  }
}
