//! # MedBill API Server
//!
//! ## Startup
//! 1. Tracing (`RUST_LOG`, default `info,medbill=debug,sqlx=warn`)
//! 2. Configuration (defaults → `medbill.toml` → `MEDBILL_*`)
//! 3. SQLite pool and migrations
//! 4. Demo account, when enabled
//! 5. Bind `host:port`, moving to the next port while the address is taken

use std::io::ErrorKind;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use medbill_db::{Database, DbConfig};
use medbill_server::{app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,medbill=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting MedBill API server...");

    let config = ServerConfig::load().context("Failed to load configuration")?;

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let db = Database::new(DbConfig::new(&db_path).max_connections(config.db_max_connections))
        .await
        .context("Failed to open database")?;
    info!(path = %db_path.display(), "Database ready");

    let state = AppState::new(db.clone(), config.clone());

    if config.seed_demo_user {
        match db.users().ensure_demo_user(state.today()).await {
            Ok(user) => info!(user_id = user.id, email = %user.email, "Demo account available"),
            Err(e) => warn!(error = %e, "Could not create demo account"),
        }
    }

    let listener = bind_with_retry(&config.host, config.port, config.port_retries).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Binds the first free port in `port..=port + retries`.
async fn bind_with_retry(host: &str, port: u16, retries: u16) -> anyhow::Result<TcpListener> {
    let mut candidate = port;
    for attempt in 0..=retries {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse && attempt < retries => {
                warn!(port = candidate, "Port in use, trying the next one");
                candidate = candidate
                    .checked_add(1)
                    .context("Ran out of port numbers")?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to bind {}:{}", host, candidate));
            }
        }
    }
    anyhow::bail!("No free port between {} and {}", port, candidate)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
