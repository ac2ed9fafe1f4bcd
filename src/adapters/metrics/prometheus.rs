//! Prometheus Metrics Registry - Yield Engine Observability
//!
//! Registers and exposes Prometheus metrics for source fetches,
//! deposit outcomes and latency, wallet connectivity and the
//! dashboard's best APY. Deposit and dashboard metrics are fed by
//! subscribing to the use cases' event channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::deposit::{DepositEvent, DepositState, DepositTarget};
use crate::domain::quote::DualApy;

/// Centralized Prometheus metrics for the yield engine.
///
/// All metrics follow the naming convention `yield_router_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// APY source requests by kind (`quotes`, `named`).
    pub source_fetches: IntCounterVec,
    /// Failed APY source requests by kind.
    pub source_failures: IntCounterVec,
    /// Finished deposits by target kind and outcome.
    pub deposits: IntCounterVec,
    /// Submission-to-terminal latency in seconds.
    pub deposit_latency_secs: HistogramVec,
    /// Wallet status (1 = connected, 0 = not connected).
    pub wallet_connected: Gauge,
    /// Latest APY per dashboard label.
    pub series_apy: GaugeVec,
    /// Best APY across the two dashboard series.
    pub best_apy: Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let source_fetches = IntCounterVec::new(
            Opts::new("yield_router_source_fetches_total", "Total APY source requests"),
            &["kind"],
        )?;

        let source_failures = IntCounterVec::new(
            Opts::new(
                "yield_router_source_failures_total",
                "Total failed APY source requests",
            ),
            &["kind"],
        )?;

        let deposits = IntCounterVec::new(
            Opts::new("yield_router_deposits_total", "Total finished deposits"),
            &["target", "outcome"],
        )?;

        let deposit_latency_secs = HistogramVec::new(
            HistogramOpts::new(
                "yield_router_deposit_latency_seconds",
                "Time from submission to confirmation or failure",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0, 180.0]),
            &["target"],
        )?;

        let wallet_connected = Gauge::new(
            "yield_router_wallet_connected",
            "Wallet connection status (1=connected, 0=not connected)",
        )?;

        let series_apy = GaugeVec::new(
            Opts::new("yield_router_series_apy", "Latest APY per dashboard series"),
            &["label"],
        )?;

        let best_apy = Gauge::new(
            "yield_router_best_apy",
            "Highest APY across the dashboard series",
        )?;

        registry.register(Box::new(source_fetches.clone()))?;
        registry.register(Box::new(source_failures.clone()))?;
        registry.register(Box::new(deposits.clone()))?;
        registry.register(Box::new(deposit_latency_secs.clone()))?;
        registry.register(Box::new(wallet_connected.clone()))?;
        registry.register(Box::new(series_apy.clone()))?;
        registry.register(Box::new(best_apy.clone()))?;

        Ok(Self {
            registry,
            source_fetches,
            source_failures,
            deposits,
            deposit_latency_secs,
            wallet_connected,
            series_apy,
            best_apy,
        })
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Record a single deposit event.
    ///
    /// `started` tracks submission times of in-flight tickets.
    pub fn record_deposit_event(&self, started: &mut HashMap<Uuid, Instant>, event: &DepositEvent) {
        let target = match event.target {
            DepositTarget::Index(_) => "index",
            DepositTarget::Highest => "highest",
        };

        match &event.state {
            DepositState::Submitting => {
                started.insert(event.ticket_id, Instant::now());
            }
            state if state.is_terminal() => {
                if let Some(start) = started.remove(&event.ticket_id) {
                    self.deposit_latency_secs
                        .with_label_values(&[target])
                        .observe(start.elapsed().as_secs_f64());
                }
                self.deposits
                    .with_label_values(&[target, state.label()])
                    .inc();
            }
            _ => {}
        }
    }

    /// Consume deposit events until the orchestrator goes away.
    #[instrument(skip_all)]
    pub async fn track_deposits(self: Arc<Self>, mut events: broadcast::Receiver<DepositEvent>) {
        let mut started = HashMap::new();
        loop {
            match events.recv().await {
                Ok(event) => self.record_deposit_event(&mut started, &event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Deposit metrics lagged behind events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Deposit metrics tracker stopped");
    }

    /// Record the dashboard pair.
    pub fn record_dual_apy(&self, apy: DualApy, label_a: &str, label_b: &str) {
        self.series_apy.with_label_values(&[label_a]).set(apy.a);
        self.series_apy.with_label_values(&[label_b]).set(apy.b);
        self.best_apy.set(apy.best().1);
    }

    /// Follow dashboard updates until the dashboard goes away.
    #[instrument(skip_all)]
    pub async fn track_dashboard(
        self: Arc<Self>,
        mut updates: watch::Receiver<Option<DualApy>>,
        label_a: String,
        label_b: String,
    ) {
        while updates.changed().await.is_ok() {
            let latest = *updates.borrow_and_update();
            if let Some(apy) = latest {
                self.record_dual_apy(apy, &label_a, &label_b);
            }
        }
        debug!("Dashboard metrics tracker stopped");
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move { metrics.render() }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
