//! resonote-server - Annotation backend
//!
//! Serves the tag vocabulary and track corpus from the data root and stores
//! one JSON record per annotated track next to a shared index.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use resonote_common::config::DataRootResolver;
use resonote_server::{build_router, AppState, DataLayout};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for resonote-server
#[derive(Parser, Debug)]
#[command(name = "resonote-server")]
#[command(about = "Annotation backend for lyric tagging")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "RESONOTE_HOST")]
    host: IpAddr,

    /// Data root holding the tag/track documents and annotations/
    /// (falls back to RESONOTE_DATA_DIR, the config file, then ./data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory of static files served for non-API paths
    #[arg(long, env = "RESONOTE_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonote_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting resonote-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let resolver = DataRootResolver::new().with_cli_arg(args.data_dir);
    let data_root = resolver.resolve();
    let public_dir = args
        .public_dir
        .or_else(|| resolver.load_config().and_then(|c| c.public_dir))
        .unwrap_or_else(|| PathBuf::from("public"));

    info!("Data root: {}", data_root.display());
    info!("Public root: {}", public_dir.display());

    let state = AppState::new(DataLayout::new(data_root), public_dir);
    state
        .annotations
        .initialize()
        .await
        .context("Failed to initialize annotations directory")?;

    let app = build_router(state);

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("resonote-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
