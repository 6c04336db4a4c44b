//! REST API for site state, history, telemetry, and live ticks.
//!
//! Endpoints:
//! - `GET /state`: config, battery, ledger, run summary, and latest tick
//! - `GET /history`: the trend series
//! - `GET /telemetry`: tick records with optional range filtering
//! - `POST /tick`: run one tick with posted readings

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::ledger::CounterStore;
use crate::sim::Site;

/// Site type served by the API, with the store chosen at runtime.
pub type SharedSite = Site<Box<dyn CounterStore + Send>>;

/// Application state shared across all request handlers.
///
/// The site sits behind an async mutex. `POST /tick` only tries the lock, so
/// an overlapping tick request is turned away instead of queued. The mutex is
/// shared so a tick can hold it from the blocking pool while the store saves.
pub struct AppState {
    /// Scenario the site was built from.
    pub config: ScenarioConfig,
    pub site: Arc<Mutex<SharedSite>>,
}

impl AppState {
    pub fn new(config: ScenarioConfig, site: SharedSite) -> Self {
        Self {
            config,
            site: Arc::new(Mutex::new(site)),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/history", get(handlers::get_history))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/tick", post(handlers::post_tick))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind to `addr` or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
