//! Quote Dashboard Binary
//!
//! Starts the live terminal quote board.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-dashboard
//! ```
//!
//! Runs until Ctrl+C or SIGTERM.
//!
//! # Environment Variables
//!
//! All optional.
//! - `QUOTES_RENDER_INTERVAL_MS`: Sleep between frames (default: 250)
//! - `QUOTES_HISTORY_PERIOD` / `QUOTES_HISTORY_INTERVAL`: Snapshot query (default: 1d / 1m)
//! - `QUOTES_CHART_BASE_URL`: Chart API host
//! - `QUOTES_STREAM_URL`: Streamer WebSocket URL
//! - `QUOTES_HEARTBEAT_INTERVAL_SECS` / `QUOTES_HEARTBEAT_TIMEOUT_SECS`: Feed liveness
//!   (default: 15 / 30)
//! - `QUOTES_MAX_RECONNECT_ATTEMPTS`: Give up after this many retries (default: 0 = never)
//! - `QUOTES_SHUTDOWN_TIMEOUT_SECS`: Wait for ingestion on exit (default: 5)
//! - `QUOTES_METRICS_PORT`: Prometheus exporter port (default: 0 = disabled)
//! - `QUOTES_LOG_FILE`: Log to this file instead of stderr
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use quote_dashboard::application::services::ShutdownOutcome;
use quote_dashboard::infrastructure::telemetry;
use quote_dashboard::{
    DashboardConfig, FeedStatus, IngestionTasks, QuoteStore, RenderContext, SnapshotLoader,
    StreamIngestor, StreamerClient, StreamerClientConfig, TelemetryConfig, TerminalSurface,
    Universe, YahooChartClient, init_metrics, run_render_loop,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the feed event channel.
const FEED_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let config = DashboardConfig::from_env().context("invalid configuration")?;

    telemetry::init(&TelemetryConfig {
        log_file: config.telemetry.log_file.clone(),
    })
    .context("failed to initialize logging")?;

    tracing::info!("Starting quote dashboard");

    if let Some(addr) =
        init_metrics(config.telemetry.metrics_port).context("failed to start metrics exporter")?
    {
        tracing::info!(addr = %addr, "Prometheus exporter listening");
    }

    log_config(&config);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let universe = Arc::new(Universe::default());
    let store = Arc::new(QuoteStore::new());
    let feed = Arc::new(FeedStatus::new());

    // Prime the store before anything is drawn.
    let chart_client =
        YahooChartClient::new(&config.history).context("failed to build HTTP client")?;
    let loader = SnapshotLoader::new(
        &chart_client,
        &config.history.period,
        &config.history.interval,
    );
    tokio::select! {
        () = shutdown_token.cancelled() => {
            println!("Exiting gracefully..");
            return Ok(());
        }
        _report = loader.load(&universe, &store) => {}
    }

    // Start ingestion.
    let (feed_tx, feed_rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
    let streamer = Arc::new(StreamerClient::new(
        StreamerClientConfig::from_settings(&config.websocket, universe.symbols()),
        feed_tx,
        shutdown_token.clone(),
    ));
    let ingestor =
        StreamIngestor::new(Arc::clone(&store), Arc::clone(&universe), Arc::clone(&feed));

    let mut tasks = IngestionTasks::new();
    tasks.push(
        "streamer",
        tokio::spawn(async move {
            if let Err(e) = streamer.run().await {
                tracing::error!(error = %e, "Streamer client stopped");
            }
        }),
    );
    tasks.push("ingestor", tokio::spawn(ingestor.run(feed_rx)));

    // Render until interrupted.
    let ctx = RenderContext {
        universe,
        store,
        feed,
    };
    let mut surface = TerminalSurface::enter().context("failed to prepare terminal")?;
    let frames =
        run_render_loop(&ctx, &mut surface, config.render.interval, shutdown_token.clone()).await;
    if let Err(e) = surface.restore() {
        tracing::warn!(error = %e, "Failed to restore terminal");
    }

    let outcome = tasks.stop(config.render.shutdown_timeout).await;
    tracing::info!(
        frames,
        clean = outcome == ShutdownOutcome::Completed,
        "Quote dashboard stopped"
    );

    println!("Exiting gracefully..");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &DashboardConfig) {
    tracing::info!(
        render_interval_ms = u64::try_from(config.render.interval.as_millis()).unwrap_or(u64::MAX),
        history_period = %config.history.period,
        history_interval = %config.history.interval,
        max_reconnect_attempts = config.websocket.max_reconnect_attempts,
        metrics_port = config.telemetry.metrics_port,
        "Configuration loaded"
    );
    tracing::debug!(
        chart_base_url = %config.history.base_url,
        stream_url = %config.websocket.url,
        "Provider endpoints"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT), then cancel `shutdown_token`.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
