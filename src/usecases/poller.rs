//! Poller - Fixed-interval Refresh Lifecycle
//!
//! Drives any [`Refresh`] target on a fixed schedule: one tick right
//! away, then one per interval. Each tick runs in a `JoinSet` owned by
//! the loop task, so stopping the poller (or dropping it) aborts the
//! loop and every refresh still in flight.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Something that can be refreshed by a poller.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
  /// Short name used in logs.
  fn name(&self) -> &'static str;

  /// Run one refresh. Failures are absorbed by the implementor.
  async fn refresh(&self);
}

/// Start/stop lifecycle around a periodic refresh.
pub struct Poller<R: Refresh> {
  target: Arc<R>,
  period: Duration,
  /// Loop task, present while running.
  handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Refresh> Poller<R> {
  /// Create a stopped poller. A zero period is raised to 1 ms.
  pub fn new(target: Arc<R>, period: Duration) -> Self {
    Self {
      target,
      period: period.max(Duration::from_millis(1)),
      handle: Mutex::new(None),
    }
  }

  /// Spawn the polling loop. Returns `false` if it was already running.
  pub fn start(&self) -> bool {
    let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().is_some_and(|h| !h.is_finished()) {
      debug!(target_name = self.target.name(), "Poller already running");
      return false;
    }

    let target = Arc::clone(&self.target);
    let period = self.period;

    *slot = Some(tokio::spawn(async move {
      let mut ticker = interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      let mut in_flight = JoinSet::new();

      loop {
        tokio::select! {
          _ = ticker.tick() => {
            let target = Arc::clone(&target);
            in_flight.spawn(async move { target.refresh().await });
          }
          Some(joined) = in_flight.join_next() => {
            if let Err(e) = joined {
              if e.is_panic() {
                warn!(error = %e, "Refresh task panicked");
              }
            }
          }
        }
      }
    }));

    info!(
      target_name = self.target.name(),
      period_ms = self.period.as_millis() as u64,
      "Poller started"
    );
    true
  }

  /// Abort the loop and any in-flight refresh. Returns `false` if idle.
  pub fn stop(&self) -> bool {
    let handle = self
      .handle
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();

    match handle {
      Some(h) => {
        h.abort();
        info!(target_name = self.target.name(), "Poller stopped");
        true
      }
      None => false,
    }
  }

  pub fn is_running(&self) -> bool {
    self
      .handle
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
      .is_some_and(|h| !h.is_finished())
  }

  /// The polled target.
  pub fn target(&self) -> &Arc<R> {
    &self.target
  }
}

impl<R: Refresh> Drop for Poller<R> {
  fn drop(&mut self) {
    self.stop();
  }
}
