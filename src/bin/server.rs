//! Flash feed HTTP server.
//!
//! Reads `config.toml` (or the path in `FLASH_CONFIG`), applies environment
//! overrides and serves the feed until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;

use flash_feed::{
    cache,
    config::load_all_deferred,
    error::{AppError, Result},
    http::{self, AppState},
    services::{FlashService, UpdateDetector},
    source,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("FLASH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let (config, fallback) = load_all_deferred(&config_path)?;
    init_tracing(&config.logging.level);
    if let Some(e) = fallback {
        tracing::warn!(path = %config_path.display(), error = %e, "config file not loaded, using defaults");
    }

    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .map_err(|e| AppError::config(format!("server.addr is invalid: {e}")))?;

    let content = source::from_config(&config)?;
    let purger = cache::purge::from_config(&config.cdn)?;
    tracing::info!(
        source = content.name(),
        purger = purger.name(),
        hot_pages = config.feed.hot_pages_limit,
        page_size = config.feed.items_per_page,
        segment_size = config.feed.segment_size,
        "flash feed starting"
    );

    let state = AppState::new(
        FlashService::new(content.clone(), &config.feed),
        UpdateDetector::new(content, &config.feed),
        purger,
    );

    http::serve(addr, http::router(state)).await
}
