//! Scenario Tests - Views, Pollers and Search Races
//!
//! Drives the use cases end-to-end against a scripted APY source.
//! Time-dependent scenarios run on tokio's paused clock so debounce
//! windows and poll intervals are exact.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use yield_router::domain::error::SourceError;
use yield_router::domain::quote::{NamedApy, ProtocolQuote};
use yield_router::domain::selection::SelectionSet;
use yield_router::ports::apy_source::ApySource;
use yield_router::usecases::{ComparisonView, Dashboard, Poller, ProtocolCatalog};

/// APY source with canned data, per-term latency and a call log.
#[derive(Default)]
struct ScriptedSource {
    catalog: Vec<ProtocolQuote>,
    named: NamedApy,
    latency: HashMap<String, Duration>,
    named_latency: Duration,
    calls: Mutex<Vec<Option<String>>>,
    named_calls: Mutex<usize>,
}

impl ScriptedSource {
    fn with_catalog(catalog: Vec<ProtocolQuote>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn named_calls(&self) -> usize {
        *self.named_calls.lock().unwrap()
    }
}

#[async_trait]
impl ApySource for ScriptedSource {
    async fn fetch_quotes(&self, search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
        self.calls.lock().unwrap().push(search.map(str::to_string));

        let term = search.unwrap_or_default();
        if let Some(delay) = self.latency.get(term) {
            tokio::time::sleep(*delay).await;
        }

        let needle = term.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|q| q.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
        *self.named_calls.lock().unwrap() += 1;
        tokio::time::sleep(self.named_latency).await;
        Ok(self.named.clone())
    }
}

fn q(name: &str, apy: f64) -> ProtocolQuote {
    ProtocolQuote::new(name, apy)
}

fn names(quotes: &[ProtocolQuote]) -> Vec<&str> {
    quotes.iter().map(|q| q.name.as_str()).collect()
}

// ── Catalog and Selection ───────────────────────────────────

#[tokio::test]
async fn test_initial_load_then_selection_then_comparison() {
    let source = Arc::new(ScriptedSource::with_catalog(vec![
        q("X", 5.0),
        q("Y", 3.0),
        q("X", 5.0),
        q("Z", 1.0),
    ]));
    let catalog = ProtocolCatalog::new(Arc::clone(&source));
    catalog.load_initial().await.unwrap();

    let shown = catalog.shown().await;
    assert_eq!(names(&shown), vec!["X", "Y", "Z"]);

    let mut selection = SelectionSet::new();
    for quote in shown.iter().cloned().chain([q("W", 2.0)]) {
        selection.toggle(quote);
    }
    assert_eq!(names(selection.members()), vec!["Y", "Z", "W"]);
    assert!(selection.can_compare());

    let view = ComparisonView::from_query(Arc::clone(&source), &selection.comparison_query());
    view.refresh().await.unwrap();
    let series = view.series().await;
    assert_eq!(names(&series), vec!["Y", "Z", "W"]);
    assert_eq!(series[2].apy, 0.0);
    assert_eq!(view.index_of("Z"), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_sends_one_search() {
    let source = Arc::new(ScriptedSource::with_catalog(vec![q("abcd", 4.0), q("xyz", 2.0)]));
    let catalog = ProtocolCatalog::new(Arc::clone(&source));

    catalog.search("a").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    catalog.search("ab").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    catalog.search("abc").await;

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(source.calls(), vec![Some("abc".to_string())]);
    assert_eq!(names(&catalog.shown().await), vec!["abcd"]);
    assert_eq!(catalog.term().await, "abc");
}

#[tokio::test(start_paused = true)]
async fn test_slow_stale_search_never_overwrites_newer_one() {
    let mut source = ScriptedSource::with_catalog(vec![q("lido", 3.0), q("aave-v3", 4.0)]);
    source.latency.insert("lido".to_string(), Duration::from_secs(2));
    source.latency.insert("aave".to_string(), Duration::from_millis(10));
    let catalog = Arc::new(ProtocolCatalog::new(Arc::new(source)));

    let slow = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.search_now("lido").await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    catalog.search_now("aave").await.unwrap();
    assert_eq!(names(&catalog.shown().await), vec!["aave-v3"]);

    slow.await.unwrap().unwrap();
    assert_eq!(names(&catalog.shown().await), vec!["aave-v3"]);
}

// ── Pollers ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_comparison_poller_refreshes_every_interval() {
    let source = Arc::new(ScriptedSource::with_catalog(vec![q("lido", 3.0), q("aave-v3", 4.0)]));
    let view = Arc::new(ComparisonView::from_query(Arc::clone(&source), "lido,aave-v3"));
    let poller = Poller::new(Arc::clone(&view), Duration::from_secs(30));

    assert!(poller.start());
    assert!(!poller.start());
    tokio::time::sleep(Duration::from_secs(61)).await;

    // Ticks at 0s, 30s and 60s, two names each.
    assert_eq!(source.calls().len(), 6);
    assert_eq!(view.series().await.len(), 2);

    assert!(poller.stop());
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.calls().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_poller_builds_history() {
    let mut source = ScriptedSource::default();
    source.named.insert("Aave-V3".to_string(), 3.1);
    source.named.insert("Binance Staked ETH".to_string(), 2.7);
    let dashboard = Arc::new(Dashboard::new(Arc::new(source), "Aave-V3", "Binance Staked ETH"));
    let poller = Poller::new(Arc::clone(&dashboard), Duration::from_secs(5));

    poller.start();
    tokio::time::sleep(Duration::from_secs(11)).await;
    drop(poller);

    assert_eq!(dashboard.history().await.len(), 3);
    assert_eq!(dashboard.best().await, Some(("Aave-V3", 3.1)));
}

#[tokio::test(start_paused = true)]
async fn test_stopping_poller_cancels_in_flight_refresh() {
    let mut source = ScriptedSource::default();
    source.named.insert("Aave-V3".to_string(), 1.0);
    source.named_latency = Duration::from_secs(10);
    let source = Arc::new(source);
    let dashboard = Arc::new(Dashboard::new(Arc::clone(&source), "Aave-V3", "Binance Staked ETH"));
    let poller = Poller::new(Arc::clone(&dashboard), Duration::from_secs(5));

    poller.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.named_calls(), 1);

    poller.stop();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(dashboard.current().await.is_none());
    assert!(dashboard.history().await.is_empty());
    assert_eq!(source.named_calls(), 1);
}

/// Named source answering each call with the next scripted (latency, APY).
struct QueuedNamedSource {
    replies: Mutex<VecDeque<(Duration, f64)>>,
}

#[async_trait]
impl ApySource for QueuedNamedSource {
    async fn fetch_quotes(&self, _search: Option<&str>) -> Result<Vec<ProtocolQuote>, SourceError> {
        Ok(Vec::new())
    }

    async fn fetch_named_quotes(&self) -> Result<NamedApy, SourceError> {
        let (delay, apy) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted call");
        tokio::time::sleep(delay).await;
        Ok(NamedApy::from([("Aave-V3".to_string(), apy)]))
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_dashboard_refresh_never_overwrites_newer_one() {
    let source = Arc::new(QueuedNamedSource {
        replies: Mutex::new(VecDeque::from([
            (Duration::from_secs(10), 1.0),
            (Duration::from_secs(1), 2.0),
        ])),
    });
    let dashboard = Arc::new(Dashboard::new(source, "Aave-V3", "Binance Staked ETH"));
    let updates = dashboard.subscribe();

    let slow = tokio::spawn({
        let dashboard = Arc::clone(&dashboard);
        async move { dashboard.refresh().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let fast = dashboard.refresh().await.unwrap();
    assert_eq!(fast.map(|apy| apy.a), Some(2.0));

    assert_eq!(slow.await.unwrap().unwrap(), None);

    assert_eq!(dashboard.current().await.map(|apy| apy.a), Some(2.0));
    let history: Vec<f64> = dashboard.history().await.iter().map(|s| s.series_a).collect();
    assert_eq!(history, vec![2.0]);
    assert_eq!((*updates.borrow()).map(|apy| apy.a), Some(2.0));
}
