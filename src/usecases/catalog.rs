//! Protocol Catalog Use Case - Search View over the APY Source
//!
//! Holds the unfiltered baseline ("all") and the currently displayed
//! set ("shown"). Searches are debounced through a single pending slot
//! with cancel-and-replace semantics, and every fetch carries a
//! generation so a slow response can never overwrite a newer one.
//! Fetch failures keep the previous view and record an advisory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::SourceError;
use crate::domain::quote::{dedupe, ProtocolQuote, INITIAL_CATALOG_CAP};
use crate::ports::apy_source::ApySource;

use super::poller::Refresh;

/// Default quiet period before a search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Default)]
struct CatalogState {
  /// Unfiltered, capped baseline.
  all: Vec<ProtocolQuote>,
  /// What the user currently sees.
  shown: Vec<ProtocolQuote>,
  /// Active search term; empty means the baseline is shown.
  term: String,
  /// Last fetch failure, cleared by the next success.
  last_error: Option<String>,
}

/// State shared with the debounced search task.
struct Shared<S: ApySource> {
  source: Arc<S>,
  state: RwLock<CatalogState>,
  search_generation: AtomicU64,
  refresh_generation: AtomicU64,
}

impl<S: ApySource> Shared<S> {
  /// Make `term` the active search and return its generation. The bump
  /// happens under the state lock so it orders against applied results.
  /// An empty term restores the baseline.
  async fn begin_search(&self, term: &str) -> u64 {
    let mut state = self.state.write().await;
    let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
    state.term = term.to_string();
    if term.is_empty() {
      state.shown = state.all.clone();
    }
    generation
  }

  async fn run_search(&self, generation: u64, term: String) -> Result<usize, SourceError> {
    let result = self.source.fetch_quotes(Some(&term)).await;

    let mut state = self.state.write().await;
    if self.search_generation.load(Ordering::SeqCst) != generation {
      debug!(term = %term, generation, "Discarding stale search result");
      return Ok(0);
    }

    match result {
      Ok(quotes) => {
        let quotes = dedupe(quotes);
        let count = quotes.len();
        state.shown = quotes;
        state.last_error = None;
        debug!(term = %term, results = count, "Search applied");
        Ok(count)
      }
      Err(e) => {
        warn!(term = %term, error = %e, "Search failed, keeping previous view");
        state.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }
}

/// Deduplicated, bounded view of the protocols offered by the source.
pub struct ProtocolCatalog<S: ApySource> {
  shared: Arc<Shared<S>>,
  /// Debounced search waiting for its quiet period.
  pending: Mutex<Option<JoinHandle<()>>>,
  debounce: Duration,
}

impl<S: ApySource> ProtocolCatalog<S> {
  /// Create an empty catalog with the default debounce.
  pub fn new(source: Arc<S>) -> Self {
    Self::with_debounce(source, SEARCH_DEBOUNCE)
  }

  pub fn with_debounce(source: Arc<S>, debounce: Duration) -> Self {
    Self {
      shared: Arc::new(Shared {
        source,
        state: RwLock::new(CatalogState::default()),
        search_generation: AtomicU64::new(0),
        refresh_generation: AtomicU64::new(0),
      }),
      pending: Mutex::new(None),
      debounce,
    }
  }

  /// Fetch the unfiltered set and show it.
  ///
  /// Deduplicates (first occurrence wins) and keeps at most
  /// [`INITIAL_CATALOG_CAP`] entries. Clears any active search.
  #[instrument(skip(self))]
  pub async fn load_initial(&self) -> Result<usize, SourceError> {
    self.cancel_pending();
    self.shared.begin_search("").await;
    self.reload_baseline().await
  }

  /// Re-fetch the baseline. It replaces the shown set only while no
  /// search term is active.
  #[instrument(skip(self))]
  pub async fn refresh(&self) -> Result<usize, SourceError> {
    self.reload_baseline().await
  }

  async fn reload_baseline(&self) -> Result<usize, SourceError> {
    let generation = self.shared.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
    let result = self.shared.source.fetch_quotes(None).await;

    let mut state = self.shared.state.write().await;
    if self.shared.refresh_generation.load(Ordering::SeqCst) != generation {
      debug!(generation, "Discarding stale baseline");
      return Ok(0);
    }

    match result {
      Ok(quotes) => {
        let mut quotes = dedupe(quotes);
        quotes.truncate(INITIAL_CATALOG_CAP);
        let count = quotes.len();
        if state.term.is_empty() {
          state.shown = quotes.clone();
        }
        state.all = quotes;
        state.last_error = None;
        info!(protocols = count, "Catalog baseline loaded");
        Ok(count)
      }
      Err(e) => {
        warn!(error = %e, "Catalog refresh failed, keeping previous view");
        state.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  /// Debounced search. Must be called inside a tokio runtime.
  ///
  /// Replaces any pending search. An empty (or blank) term cancels the
  /// pending search and restores the baseline without a network call.
  pub async fn search(&self, term: &str) {
    let term = term.trim().to_string();
    self.cancel_pending();
    let generation = self.shared.begin_search(&term).await;
    if term.is_empty() {
      return;
    }

    let shared = Arc::clone(&self.shared);
    let debounce = self.debounce;
    let task = tokio::spawn(async move {
      tokio::time::sleep(debounce).await;
      let _ = shared.run_search(generation, term).await;
    });

    *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
  }

  /// Search right away, bypassing the debounce. Still generation-guarded.
  #[instrument(skip(self))]
  pub async fn search_now(&self, term: &str) -> Result<Vec<ProtocolQuote>, SourceError> {
    let term = term.trim().to_string();
    self.cancel_pending();
    let generation = self.shared.begin_search(&term).await;
    if term.is_empty() {
      return Ok(self.shown().await);
    }

    self.shared.run_search(generation, term).await?;
    Ok(self.shown().await)
  }

  fn cancel_pending(&self) {
    if let Some(task) = self
      .pending
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take()
    {
      task.abort();
    }
  }

  /// Unfiltered baseline.
  pub async fn all(&self) -> Vec<ProtocolQuote> {
    self.shared.state.read().await.all.clone()
  }

  /// Currently displayed quotes.
  pub async fn shown(&self) -> Vec<ProtocolQuote> {
    self.shared.state.read().await.shown.clone()
  }

  pub async fn term(&self) -> String {
    self.shared.state.read().await.term.clone()
  }

  /// Advisory from the last failed fetch, if the view is stale.
  pub async fn last_error(&self) -> Option<String> {
    self.shared.state.read().await.last_error.clone()
  }
}

impl<S: ApySource> Drop for ProtocolCatalog<S> {
  fn drop(&mut self) {
    self.cancel_pending();
  }
}

#[async_trait]
impl<S: ApySource> Refresh for ProtocolCatalog<S> {
  fn name(&self) -> &'static str {
    "catalog"
  }

  async fn refresh(&self) {
    let _ = ProtocolCatalog::refresh(self).await;
  }
}
