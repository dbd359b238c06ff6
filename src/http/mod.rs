//! HTTP surface of the feed.

mod handlers;
pub mod response;
mod webhooks;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CachePurger;
use crate::error::Result;
use crate::services::{FlashService, UpdateDetector};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub flashes: FlashService,
    pub updates: UpdateDetector,
    pub purger: Arc<dyn CachePurger>,
}

impl AppState {
    pub fn new(flashes: FlashService, updates: UpdateDetector, purger: Arc<dyn CachePurger>) -> Self {
        Self {
            flashes,
            updates,
            purger,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/flashes/top", get(handlers::top))
        .route("/flashes/check-updates", get(handlers::check_updates))
        .route("/flashes/segment/:segment_id", get(handlers::segment))
        .route("/flashes/:slug", get(handlers::flash_detail))
        .route("/categories", get(handlers::categories))
        .route("/categories/:slug", get(handlers::category))
        .route("/header", get(handlers::header))
        .route("/webhooks/content-changed", post(webhooks::content_changed))
        .route("/webhooks/header-purge", post(webhooks::header_purge))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
