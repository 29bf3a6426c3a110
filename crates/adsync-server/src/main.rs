//! # adsync-server
//!
//! Dealership ad sync service.
//!
//! This binary provides:
//! - **Ad records** kept locally (SQLite or in-memory) as the source of truth
//! - **Marketplace sync** through the Pro Import API, best-effort per call
//! - **REST API** (axum) under `/api/blocket-ads` for the dealer dashboard
//! - **Per-user rate limiting** to protect the marketplace quota

mod api;
mod auth;
mod config;
mod error;
mod rate_limit;
mod sync;

use std::sync::Arc;

use adsync_market::{HttpMarketplaceClient, MarketplaceClient};
use adsync_store::{AdRecordStore, Directory, MemoryAdStore, SqliteAdStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::sync::AdSyncCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,adsync_server=debug")),
        )
        .init();

    info!("Starting adsync server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Ad record store
    let store: Arc<dyn AdRecordStore> = match &config.database_path {
        Some(path) => {
            info!(path = %path.display(), "Using SQLite ad store");
            Arc::new(SqliteAdStore::open(path)?)
        }
        None => {
            warn!("DATABASE_PATH not set, ad records will not survive a restart");
            Arc::new(MemoryAdStore::new())
        }
    };

    // Vehicles and users
    let directory = match &config.directory_seed_path {
        Some(path) => {
            let directory = Directory::load(path)?;
            info!(path = %path.display(), "Loaded directory seed");
            directory
        }
        None => {
            info!("DIRECTORY_SEED_PATH not set, using demo inventory");
            Directory::sample()
        }
    };

    // Marketplace client (absent means local-only mode)
    let marketplace: Option<Arc<dyn MarketplaceClient>> = match &config.marketplace_token {
        Some(token) => {
            let client = HttpMarketplaceClient::new(
                &config.marketplace_url,
                token.clone(),
                config.marketplace_timeout,
            )?;
            info!(url = %config.marketplace_url, "Marketplace sync enabled");
            Some(Arc::new(client))
        }
        None => {
            warn!("BLOCKET_API_TOKEN not set, running in local-only mode");
            None
        }
    };

    let coordinator = AdSyncCoordinator::new(
        store,
        Arc::new(directory),
        marketplace,
        config.default_dealer_code.clone(),
        config.marketplace_timeout,
    );
    info!(
        marketplace = coordinator.marketplace_enabled(),
        dealer_code = %config.default_dealer_code,
        "Sync coordinator ready"
    );

    let rate_limiter = RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst);

    let http_addr = config.http_addr;
    let app_state = AppState {
        coordinator: Arc::new(coordinator),
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
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
