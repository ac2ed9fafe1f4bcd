//! APY Source Port - Yield Data Interface
//!
//! Defines the trait for fetching normalized protocol yields from an
//! external data source. A single call is a single round-trip; retries
//! are left to the polling schedule.

use async_trait::async_trait;

use crate::domain::error::SourceError;
use crate::domain::quote::{NamedApy, ProtocolQuote};

/// Trait for yield data providers.
///
/// Implementors return fresh quote sets on every call. Callers treat
/// any error as transient and keep their last known good view.
#[async_trait]
pub trait ApySource: Send + Sync + 'static {
  /// Fetch protocol quotes.
  ///
  /// `None` or an empty term returns the unfiltered top-N set; a
  /// non-empty term returns the source-side filtered set.
  async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError>;

  /// Fetch the label → APY mapping used by the dashboard.
  async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError>;
}

/// Lets a source chosen at runtime stand in for a concrete one.
#[async_trait]
impl ApySource for Box<dyn ApySource> {
  async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
    (**self).fetch_quotes(search).await
  }

  async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
    (**self).fetch_named_quotes().await
  }
}
