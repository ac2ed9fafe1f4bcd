//! Yield Router — Entry Point
//!
//! Loads configuration, initializes logging and wires the APY source,
//! the views and the wallet/deposit pipeline for one subcommand.
//!
//! Subcommands:
//! - `watch`: poll catalog and dashboard, serve /live, /ready, /metrics
//! - `search <term>`: one catalog search
//! - `compare <query> [--deposit <name>] [--watch]`: compare, optionally
//!   deposit, optionally keep polling the comparison
//! - `deposit-highest`: deposit the stake via `depositHighest()`

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use yield_router::adapters::api::{ApyClient, ApyClientConfig, PoolListSource};
use yield_router::adapters::chain::LocalKeyConnector;
use yield_router::adapters::identity::gate_from_config;
use yield_router::adapters::metrics::{HealthServer, HealthState, MeteredSource, MetricsRegistry};
use yield_router::config::{self, AppConfig, SourceKind};
use yield_router::domain::deposit::{DepositEvent, DepositTicket};
use yield_router::ports::apy_source::ApySource;
use yield_router::usecases::{
    ComparisonView, Dashboard, DepositOrchestrator, Poller, ProtocolCatalog, WalletSession,
};

type Source = MeteredSource<Box<dyn ApySource>>;

#[derive(Debug, Parser)]
#[command(name = "yield-router", version, about = "Compare protocol APYs and route deposits")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the catalog and dashboard until Ctrl-C.
    Watch {
        /// Also connect the wallet and report it in health and metrics.
        #[arg(long)]
        connect: bool,
    },
    /// Search protocols by name.
    Search { term: String },
    /// Compare protocols from a comma-separated, percent-encoded list.
    Compare {
        query: String,
        /// Deposit the stake into this protocol of the list.
        #[arg(long)]
        deposit: Option<String>,
        /// Keep refreshing the comparison until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
    /// Deposit the stake into the highest-yield protocol.
    DepositHighest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&cli.config).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging (stderr) ──────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        source = ?config.source.kind,
        "Starting yield router"
    );

    // ── 3. Metrics, health and the APY source ───────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let health = Arc::new(HealthState::new());
    let source = Arc::new(MeteredSource::new(
        build_source(&config)?,
        Arc::clone(&metrics),
        Arc::clone(&health),
    ));

    match cli.command {
        Command::Watch { connect } => run_watch(config, source, metrics, health, connect).await,
        Command::Search { term } => run_search(&config, source, &term).await,
        Command::Compare {
            query,
            deposit,
            watch,
        } => run_compare(&config, source, &metrics, &query, deposit, watch).await,
        Command::DepositHighest => {
            let orchestrator = build_orchestrator(&config, &metrics).await?;
            let ticket = orchestrator.deposit_highest().await?;
            print_ticket(&ticket)
        }
    }
}

/// Pick the configured `ApySource` adapter.
fn build_source(config: &AppConfig) -> Result<Box<dyn ApySource>> {
    let client_config = ApyClientConfig {
        base_url: config.source.base_url.clone(),
        timeout: Duration::from_millis(config.source.timeout_ms),
    };

    let source: Box<dyn ApySource> = match config.source.kind {
        SourceKind::Api => Box::new(ApyClient::new(client_config).context("Failed to create APY client")?),
        SourceKind::Pools => Box::new(
            PoolListSource::new(
                config.source.pools_url.clone(),
                config.source.top_n,
                vec![config.source.label_a.clone(), config.source.label_b.clone()],
                &client_config,
            )
            .context("Failed to create pool list source")?,
        ),
    };
    Ok(source)
}

fn build_session(config: &AppConfig) -> Result<Arc<WalletSession<LocalKeyConnector>>> {
    let aggregator = config::loader::aggregator_address(config)?;
    let connector = Arc::new(
        LocalKeyConnector::new(config.chain.rpc_url.clone())
            .with_confirmation_timeout(config.deposit.confirmation_timeout()),
    );
    Ok(Arc::new(
        WalletSession::new(connector, aggregator).with_identity(gate_from_config(&config.identity)),
    ))
}

/// Connect the wallet and build a deposit orchestrator whose state
/// transitions are logged and counted.
async fn build_orchestrator(
    config: &AppConfig,
    metrics: &Arc<MetricsRegistry>,
) -> Result<DepositOrchestrator<LocalKeyConnector>> {
    let session = build_session(config)?;
    let wallet = session.connect().await.context("Wallet connection failed")?;
    if let Some(advisory) = session.advisory().await {
        warn!(advisory = %advisory, "Network advisory");
    }
    info!(address = %wallet.address, chain_id = wallet.chain_id, "Wallet ready");
    metrics.wallet_connected.set(1.0);

    let orchestrator = DepositOrchestrator::new(session, config::loader::stake_wei(config)?);
    tokio::spawn(log_deposit_events(orchestrator.subscribe()));
    tokio::spawn(Arc::clone(metrics).track_deposits(orchestrator.subscribe()));
    Ok(orchestrator)
}

async fn log_deposit_events(mut events: broadcast::Receiver<DepositEvent>) {
    while let Ok(event) = events.recv().await {
        info!(
            ticket = %event.ticket_id,
            target = %event.target,
            state = event.state.label(),
            "Deposit state changed"
        );
    }
}

fn print_ticket(ticket: &DepositTicket) -> Result<()> {
    let summary = serde_json::json!({
        "ticket": ticket.id,
        "target": ticket.target.to_string(),
        "amount_wei": ticket.amount.to_string(),
        "state": ticket.state.label(),
        "tx_hash": ticket.tx_hash().map(|h| h.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_search(config: &AppConfig, source: Arc<Source>, term: &str) -> Result<()> {
    let catalog = ProtocolCatalog::with_debounce(source, config.polling.search_debounce());
    if let Err(e) = catalog.load_initial().await {
        warn!(error = %e, "Baseline unavailable");
    }
    let quotes = catalog.search_now(term).await?;
    println!("{}", serde_json::to_string_pretty(&quotes)?);
    Ok(())
}

async fn run_compare(
    config: &AppConfig,
    source: Arc<Source>,
    metrics: &Arc<MetricsRegistry>,
    query: &str,
    deposit: Option<String>,
    watch: bool,
) -> Result<()> {
    let view = Arc::new(ComparisonView::from_query(source, query));
    view.refresh().await?;
    println!("{}", serde_json::to_string_pretty(&view.series().await)?);

    if let Some(name) = deposit {
        let orchestrator = build_orchestrator(config, metrics).await?;
        let ticket = orchestrator.deposit_to_protocol(&name, view.names()).await?;
        print_ticket(&ticket)?;
    }

    if watch {
        watch_comparison(config, view).await?;
    }
    Ok(())
}

/// Poll the comparison and print it once per interval until Ctrl-C.
async fn watch_comparison(config: &AppConfig, view: Arc<ComparisonView<Source>>) -> Result<()> {
    let period = config.polling.comparison_interval();
    let poller = Poller::new(Arc::clone(&view), period);
    poller.start();

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(advisory) = view.last_error().await {
                    warn!(advisory = %advisory, "Comparison is stale");
                }
                println!("{}", serde_json::to_string_pretty(&view.series().await)?);
            }
            signal = signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    poller.stop();
    info!("Comparison watch stopped");
    Ok(())
}

/// Run the polling views with health and metrics servers until Ctrl-C.
async fn run_watch(
    config: AppConfig,
    source: Arc<Source>,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
    connect: bool,
) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // ── Health and metrics servers ──────────────────────────
    let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
    let health_handle = tokio::spawn({
        let shutdown = shutdown_tx.subscribe();
        async move {
            if let Err(e) = health_server.run(shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }
    });

    let metrics_handle = config.metrics.enabled.then(|| {
        let registry = Arc::clone(&metrics);
        let bind = config.metrics.bind_address.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = registry.serve(bind, shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    // ── Views and pollers ───────────────────────────────────
    let catalog = Arc::new(ProtocolCatalog::with_debounce(
        Arc::clone(&source),
        config.polling.search_debounce(),
    ));
    let dashboard = Arc::new(Dashboard::new(
        Arc::clone(&source),
        config.source.label_a.clone(),
        config.source.label_b.clone(),
    ));
    tokio::spawn(Arc::clone(&metrics).track_dashboard(
        dashboard.subscribe(),
        config.source.label_a.clone(),
        config.source.label_b.clone(),
    ));

    let catalog_poller = Poller::new(Arc::clone(&catalog), config.polling.comparison_interval());
    let dashboard_poller = Poller::new(Arc::clone(&dashboard), config.polling.dashboard_interval());
    catalog_poller.start();
    dashboard_poller.start();

    // ── Optional wallet session ─────────────────────────────
    if connect {
        let session = build_session(&config)?;
        match session.connect().await {
            Ok(wallet) => {
                health.wallet_connected.store(true, Ordering::Relaxed);
                metrics.wallet_connected.set(1.0);
                info!(address = %wallet.address, chain_id = wallet.chain_id, "Wallet connected");
                if let Some(advisory) = session.advisory().await {
                    warn!(advisory = %advisory, "Network advisory");
                }
            }
            Err(e) => warn!(error = %e, "Wallet connection failed, continuing without wallet"),
        }
    }

    info!("All tasks spawned — yield router is running");

    signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("SIGINT received, initiating graceful shutdown");

    // 1. Readiness probe → 503
    health.running.store(false, Ordering::Relaxed);

    // 2. Stop polling, cancelling in-flight refreshes
    catalog_poller.stop();
    dashboard_poller.stop();

    // 3. Stop servers
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
