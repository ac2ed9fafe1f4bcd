//! Rolling APY history for the two dashboard series.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::quote::DualApy;

/// Samples kept by the buffer (20 retained + the newest).
pub const HISTORY_CAPACITY: usize = 21;

/// One point on the dashboard chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub series_a: f64,
    pub series_b: f64,
}

impl HistorySample {
    pub fn now(apy: DualApy) -> Self {
        Self::at(Utc::now(), apy)
    }

    pub fn at(timestamp: DateTime<Utc>, apy: DualApy) -> Self {
        Self {
            timestamp,
            series_a: apy.a,
            series_b: apy.b,
        }
    }
}

/// Bounded, chronologically ordered sample window.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    samples: VecDeque<HistorySample>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a sample, dropping the oldest beyond capacity.
    ///
    /// A sample stamped earlier than the newest one is clamped to the newest
    /// timestamp so the window stays non-decreasing.
    pub fn append(&mut self, mut sample: HistorySample) {
        if let Some(last) = self.samples.back() {
            if sample.timestamp < last.timestamp {
                sample.timestamp = last.timestamp;
            }
        }
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// Copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<HistorySample> {
        self.samples.iter().copied().collect()
    }
}
