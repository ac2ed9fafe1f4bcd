//! Protocol yield quotes.
//!
//! A quote is a single `{name, apy}` data point produced by the APY source.
//! Quotes are replaced wholesale on every fetch and never mutated in place.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Maximum number of quotes kept from the unfiltered initial load.
pub const INITIAL_CATALOG_CAP: usize = 5;

/// A named APY data point for one external protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolQuote {
    /// Protocol name, unique key within a result set.
    pub name: String,
    /// Annual percentage yield, in percent.
    pub apy: f64,
}

impl ProtocolQuote {
    /// Build a quote, clamping negative or non-finite yields to zero.
    pub fn new(name: impl Into<String>, apy: f64) -> Self {
        let apy = if apy.is_finite() && apy > 0.0 { apy } else { 0.0 };
        Self {
            name: name.into(),
            apy,
        }
    }
}

/// Drop later entries whose `name` was already seen, keeping the first.
pub fn dedupe(quotes: Vec<ProtocolQuote>) -> Vec<ProtocolQuote> {
    let mut seen = HashSet::with_capacity(quotes.len());
    quotes
        .into_iter()
        .filter(|q| seen.insert(q.name.clone()))
        .collect()
}

/// Label → APY mapping returned by the named-quotes endpoint.
pub type NamedApy = HashMap<String, f64>;

/// The two fixed series shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DualApy {
    /// APY for the first configured label.
    pub a: f64,
    /// APY for the second configured label.
    pub b: f64,
}

impl DualApy {
    /// Pull the two labels out of a named mapping; missing labels read as 0.
    pub fn from_named(named: &NamedApy, label_a: &str, label_b: &str) -> Self {
        Self {
            a: named.get(label_a).copied().unwrap_or(0.0),
            b: named.get(label_b).copied().unwrap_or(0.0),
        }
    }
}

/// Which of the two dashboard series currently yields more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    A,
    B,
}

impl DualApy {
    /// Best series; `A` wins ties.
    pub fn best(&self) -> (Series, f64) {
        if self.a >= self.b {
            (Series::A, self.a)
        } else {
            (Series::B, self.b)
        }
    }
}
