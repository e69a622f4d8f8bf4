//! snotes-server - Session Notes API and real-time sync server
//!
//! Serves the project/song/step/cell/note HTTP API and pushes project
//! events to WebSocket subscribers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use snotes_common::config::{load_toml_config, Overrides, ServerSettings};
use snotes_common::db::init_database;
use snotes_server::auth::SqliteSessionStore;
use snotes_server::realtime::ChannelHub;
use snotes_server::{build_router, cors_layer, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for snotes-server
#[derive(Parser, Debug)]
#[command(name = "snotes-server")]
#[command(about = "Session Notes collaborative checklist server")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "SNOTES_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SNOTES_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "SNOTES_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "SNOTES_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref());
    let settings = ServerSettings::resolve(
        &Overrides {
            host: args.host,
            port: args.port,
            database_path: args.database,
        },
        &toml_config,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Session Notes server (snotes-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database path: {}", settings.database_path.display());

    let pool = init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let hub = ChannelHub::new(settings.channel_capacity);
    let sessions = Arc::new(SqliteSessionStore::new(pool.clone()));
    let state = AppState::new(pool, hub.clone(), sessions);
    let app = build_router(state).layer(cors_layer(&settings.cors_origins));

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("snotes-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Open WebSockets never finish on their own, so the hub is told to close
/// them once a signal arrives.
async fn shutdown_signal(hub: ChannelHub) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    hub.shutdown();
}
