//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development: in-memory store, demo inventory and
//! no marketplace credential (local-only mode).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use adsync_shared::constants::{
    DEFAULT_DEALER_CODE, DEFAULT_HTTP_PORT, DEFAULT_MARKETPLACE_TIMEOUT_SECS,
    DEFAULT_MARKETPLACE_URL,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Marketplace API token. `None` disables every remote call.
    /// Env: `BLOCKET_API_TOKEN`
    pub marketplace_token: Option<String>,

    /// Marketplace API base URL.
    /// Env: `BLOCKET_API_URL`
    pub marketplace_url: String,

    /// Upper bound on a single marketplace call.
    /// Env: `MARKETPLACE_TIMEOUT_SECS`
    /// Default: 15 seconds
    pub marketplace_timeout: Duration,

    /// Dealer code sent when the ad owner has no dealership on file.
    /// Env: `DEFAULT_DEALER_CODE`
    pub default_dealer_code: String,

    /// SQLite file for ad records. `None` keeps records in memory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// JSON seed with vehicles and users. `None` loads the demo inventory.
    /// Env: `DIRECTORY_SEED_PATH`
    pub directory_seed_path: Option<PathBuf>,

    /// Sustained requests per second per caller.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst size per caller.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            marketplace_token: None,
            marketplace_url: DEFAULT_MARKETPLACE_URL.to_string(),
            marketplace_timeout: Duration::from_secs(DEFAULT_MARKETPLACE_TIMEOUT_SECS),
            default_dealer_code: DEFAULT_DEALER_CODE.to_string(),
            database_path: None,
            directory_seed_path: None,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
        }
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field(
                "marketplace_token",
                &self.marketplace_token.as_ref().map(|_| "<redacted>"),
            )
            .field("marketplace_url", &self.marketplace_url)
            .field("marketplace_timeout", &self.marketplace_timeout)
            .field("default_dealer_code", &self.default_dealer_code)
            .field("database_path", &self.database_path)
            .field("directory_seed_path", &self.directory_seed_path)
            .field("rate_limit_per_sec", &self.rate_limit_per_sec)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(token) = lookup("BLOCKET_API_TOKEN") {
            let token = token.trim();
            if !token.is_empty() {
                config.marketplace_token = Some(token.to_string());
            }
        }

        if let Some(url) = lookup("BLOCKET_API_URL") {
            if !url.trim().is_empty() {
                config.marketplace_url = url.trim().to_string();
            }
        }

        if let Some(val) = lookup("MARKETPLACE_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.marketplace_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid MARKETPLACE_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(code) = lookup("DEFAULT_DEALER_CODE") {
            if !code.trim().is_empty() {
                config.default_dealer_code = code.trim().to_string();
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("DIRECTORY_SEED_PATH").filter(|p| !p.is_empty()) {
            config.directory_seed_path = Some(PathBuf::from(path));
        }

        if let Some(rate) = lookup("RATE_LIMIT_PER_SEC").and_then(|v| parse_positive(&v)) {
            config.rate_limit_per_sec = rate;
        }

        if let Some(burst) = lookup("RATE_LIMIT_BURST").and_then(|v| parse_positive(&v)) {
            config.rate_limit_burst = burst;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Whether remote calls are enabled.
    pub fn marketplace_enabled(&self) -> bool {
        self.marketplace_token.is_some()
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
