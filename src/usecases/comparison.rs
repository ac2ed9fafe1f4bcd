//! Comparison View Use Case - Side-by-side APY for Selected Protocols
//!
//! Built from a comparison query (percent-encoded names joined by `,`).
//! Each refresh searches every name concurrently and keeps one quote per
//! name, in query order. The position of a name in that list is the
//! index used for `depositTo`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::domain::error::SourceError;
use crate::domain::quote::ProtocolQuote;
use crate::domain::selection::parse_comparison_query;
use crate::ports::apy_source::ApySource;

use super::poller::Refresh;

/// Pick the quote for `name` out of its search results.
///
/// Exact name match first, then the first hit, then a zero quote. The
/// requested name is kept either way.
pub fn pick_quote(name: &str, hits: &[ProtocolQuote]) -> ProtocolQuote {
  let apy = hits
    .iter()
    .find(|q| q.name == name)
    .or_else(|| hits.first())
    .map_or(0.0, |q| q.apy);
  ProtocolQuote::new(name, apy)
}

#[derive(Debug, Default)]
struct ComparisonState {
  series: Vec<ProtocolQuote>,
  last_error: Option<String>,
}

/// Live APY comparison for a fixed list of protocol names.
pub struct ComparisonView<S: ApySource> {
  source: Arc<S>,
  names: Vec<String>,
  state: RwLock<ComparisonState>,
  generation: AtomicU64,
}

impl<S: ApySource> ComparisonView<S> {
  pub fn new(source: Arc<S>, names: Vec<String>) -> Self {
    Self {
      source,
      names,
      state: RwLock::new(ComparisonState::default()),
      generation: AtomicU64::new(0),
    }
  }

  /// Build the view from a raw comparison query.
  pub fn from_query(source: Arc<S>, raw: &str) -> Self {
    Self::new(source, parse_comparison_query(raw))
  }

  /// Re-fetch every name concurrently.
  ///
  /// If any fetch fails the previous series is kept whole.
  #[instrument(skip(self), fields(protocols = self.names.len()))]
  pub async fn refresh(&self) -> Result<(), SourceError> {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

    let fetches = self.names.iter().map(|name| {
      let source = Arc::clone(&self.source);
      async move {
        source
          .fetch_quotes(Some(name.as_str()))
          .await
          .map(|hits| pick_quote(name, &hits))
      }
    });
    let results: Result<Vec<ProtocolQuote>, SourceError> =
      join_all(fetches).await.into_iter().collect();

    let mut state = self.state.write().await;
    if self.generation.load(Ordering::SeqCst) != generation {
      debug!(generation, "Discarding stale comparison");
      return Ok(());
    }

    match results {
      Ok(series) => {
        state.series = series;
        state.last_error = None;
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "Comparison refresh failed, keeping previous series");
        state.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  /// Requested names, in query order.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  /// Position of `name` in the comparison list.
  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.names.iter().position(|n| n == name)
  }

  pub async fn series(&self) -> Vec<ProtocolQuote> {
    self.state.read().await.series.clone()
  }

  pub async fn last_error(&self) -> Option<String> {
    self.state.read().await.last_error.clone()
  }
}

#[async_trait]
impl<S: ApySource> Refresh for ComparisonView<S> {
  fn name(&self) -> &'static str {
    "comparison"
  }

  async fn refresh(&self) {
    let _ = ComparisonView::refresh(self).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::quote::NamedApy;
  use std::sync::atomic::AtomicBool;

  struct SearchSource {
    catalog: Vec<ProtocolQuote>,
    fail: AtomicBool,
  }

  #[async_trait]
  impl ApySource for SearchSource {
    async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
      if self.fail.load(Ordering::SeqCst) {
        return Err(SourceError::unavailable("timeout"));
      }
      let term = search.unwrap_or_default().to_lowercase();
      Ok(
        self
          .catalog
          .iter()
          .filter(|q| q.name.to_lowercase().contains(&term))
          .cloned()
          .collect(),
      )
    }

    async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
      Ok(NamedApy::new())
    }
  }

  fn source() -> Arc<SearchSource> {
    Arc::new(SearchSource {
      catalog: vec![
        ProtocolQuote::new("aave-v2", 2.0),
        ProtocolQuote::new("aave-v3", 4.0),
        ProtocolQuote::new("lido", 3.0),
      ],
      fail: AtomicBool::new(false),
    })
  }

  #[test]
  fn test_pick_prefers_exact_then_first_then_zero() {
    let hits = vec![ProtocolQuote::new("aave-v2", 2.0), ProtocolQuote::new("aave-v3", 4.0)];
    assert_eq!(pick_quote("aave-v3", &hits).apy, 4.0);
    assert_eq!(pick_quote("aave", &hits).apy, 2.0);
    let none = pick_quote("curve", &[]);
    assert_eq!(none.name, "curve");
    assert_eq!(none.apy, 0.0);
  }

  #[tokio::test]
  async fn test_refresh_keeps_query_order() {
    let view = ComparisonView::from_query(source(), "lido,aave-v3,curve");
    view.refresh().await.unwrap();

    let series = view.series().await;
    let pairs: Vec<_> = series.iter().map(|q| (q.name.as_str(), q.apy)).collect();
    assert_eq!(pairs, vec![("lido", 3.0), ("aave-v3", 4.0), ("curve", 0.0)]);
    assert_eq!(view.index_of("aave-v3"), Some(1));
    assert_eq!(view.index_of("uniswap"), None);
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_previous_series() {
    let src = source();
    let view = ComparisonView::new(Arc::clone(&src), vec!["lido".into()]);
    view.refresh().await.unwrap();

    src.fail.store(true, Ordering::SeqCst);
    assert!(view.refresh().await.is_err());
    assert_eq!(view.series().await[0].apy, 3.0);
    assert!(view.last_error().await.is_some());
  }
}
