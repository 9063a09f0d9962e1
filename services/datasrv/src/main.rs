//! Datasrv entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use datasrv::bootstrap;
use datasrv::config::{DatasrvConfig, DEFAULT_CONFIG_PATH};
use datasrv::routes::create_routes;
use datasrv::store::PointValueStore;
use point_rtdb::HotCache;

#[derive(Parser, Debug)]
#[command(author, version, about = "Datasrv - point value ingestion and query service")]
struct Args {
    /// Configuration file (defaults to config/datasrv.yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log filter
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and backend connectivity, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = DatasrvConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Held until exit so buffered file logs are flushed
    let _log_guard = common::init_logging(&config.service.name, &config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Starting {} v{} (config: {})",
        config.service.name,
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    match args.command {
        Some(Commands::Check) => check(config).await,
        None => run(config).await,
    }
}

async fn check(config: DatasrvConfig) -> Result<()> {
    let backends = bootstrap::connect_backends(&config).await?;
    backends.store.ping().await.context("Store check failed")?;
    backends.cache.ping().await.context("Cache check failed")?;
    info!("Configuration and backends OK");
    Ok(())
}

async fn run(config: DatasrvConfig) -> Result<()> {
    let addr: SocketAddr = config
        .service
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.service.bind_address()))?;

    let state = Arc::new(bootstrap::build_state(config).await?);
    let pool = state.pool.clone();
    let app = create_routes(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("API server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let shutdown_token = CancellationToken::new();
    let server_token = shutdown_token.clone();
    let server_handle = tokio::spawn(async move {
        let shutdown = async move { server_token.cancelled().await };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("Server error: {}", e);
        }
    });

    let signal = common::wait_for_shutdown().await;
    info!("{} received, shutting down", signal);

    shutdown_token.cancel();
    if let Err(e) = server_handle.await {
        error!("Server task failed: {}", e);
    }
    // Accepted readings are still being written; let them finish
    pool.shutdown().await;
    info!("Datasrv stopped");
    Ok(())
}
