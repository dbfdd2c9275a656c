//! # verdant-server
//!
//! REST backend for the Verdant storefront.
//!
//! This binary provides:
//! - **Order intake**: schema-validated order creation with server-side
//!   pricing adjustments and opportunistic account linkage
//! - **Order reads**: per-user paginated history and public order lookup
//! - **Auth**: registration, login, token verification and profile
//!   management behind an identity guard
//! - **Document store**: users and orders persisted in SQLite

mod api;
mod auth;
mod config;
mod db;
mod error;
mod guard;
mod orders;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::db::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,verdant_server=debug")),
        )
        .init();

    info!("Starting Verdant API server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the document store
    // -----------------------------------------------------------------------
    let db = Db::open_at(&config.database_path)?;

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Hourly purge of expired sessions.
    let purge_db = state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let db = purge_db.lock().await;
            match db.purge_expired_sessions(chrono::Utc::now()) {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session purge failed"),
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let http_addr = state.config.http_addr;

    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
