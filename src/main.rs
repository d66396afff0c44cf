//! DEX Order Engine - Entry Point
//!
//! Initializes configuration, logging, the execution engine and its
//! HTTP surfaces. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config (ENGINE_CONFIG, default config.toml) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Wire store, hub, venues, pipeline and admission queue
//! 4. Spawn Prometheus server + metrics recorder (if enabled)
//! 5. Spawn retention sweeper (if a TTL is configured)
//! 6. Serve the order API and status stream
//! 7. Wait for SIGINT -> broadcast shutdown -> drain servers

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use dex_order_engine::adapters::http::{self, AppState};
use dex_order_engine::adapters::metrics::{MetricsRecorder, MetricsRegistry};
use dex_order_engine::bootstrap::Engine;
use dex_order_engine::config::{self, AppConfig};
use dex_order_engine::usecases::RetentionSweeper;

const CONFIG_ENV: &str = "ENGINE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        config::loader::load_config(&config_path).context("Failed to load configuration")?
    } else {
        AppConfig::default()
    };

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.engine.log_level)),
        )
        .json()
        .init();

    if !config_found {
        warn!(path = %config_path, "Config file not found, using built-in defaults");
    }
    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        venues = config.venues.len(),
        max_concurrent = config.queue.max_concurrent,
        "Starting DEX order engine"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Wire the engine ──────────────────────────────────
    let engine = Engine::build(&config);

    // ── 5. Metrics server + recorder ────────────────────────
    let metrics = if config.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

        let server = Arc::clone(&registry);
        let bind_address = config.metrics.bind_address.clone();
        let server_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server.serve(bind_address, server_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        });

        let recorder = MetricsRecorder::new(
            Arc::clone(&registry),
            Arc::clone(&engine.queue),
            Arc::clone(&engine.hub),
        );
        tokio::spawn(recorder.run(shutdown_tx.subscribe()));
        Some(registry)
    } else {
        None
    };

    // ── 6. Retention sweeper ────────────────────────────────
    if let Some(ttl_secs) = config.retention.completed_ttl_secs {
        let sweeper = RetentionSweeper::new(
            Arc::clone(&engine.store),
            Duration::from_secs(ttl_secs),
            Duration::from_secs(config.retention.sweep_interval_secs),
        );
        tokio::spawn(sweeper.run(shutdown_tx.subscribe()));
    }

    // ── 7. Order API + status stream ────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.engine.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.engine.bind_address))?;
    let state = AppState {
        queue: Arc::clone(&engine.queue),
        hub: Arc::clone(&engine.hub),
        metrics,
    };
    let api_shutdown = shutdown_tx.subscribe();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(listener, state, api_shutdown).await {
            error!(error = %e, "Order API failed");
        }
    });

    info!("All tasks spawned - engine is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());
    info!(
        in_flight = engine.queue.in_flight(),
        pending = engine.queue.pending(),
        "Shutdown signal broadcast to all tasks"
    );

    // In-flight orders are abandoned; the store is in-memory only.
    let _ = tokio::time::timeout(Duration::from_secs(5), api_handle).await;

    info!("Shutdown complete");
    Ok(())
}
