//! HTTP gateway for the Portico citizen portal.
//!
//! Page requests pass the session gate, then the offline layer (network
//! first, cache as fallback). `/api/*` goes to the REST backend with the
//! session cookie turned into a bearer token.

pub mod backend;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::GatewayConfig;
pub use gate::{AuthGate, GateDecision};
pub use state::{AppState, build_store};

use axum::Router;
use portico_core::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
}

/// Run the gateway until ctrl-c. The offline layer installs in the
/// background while requests are already being served.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let store = build_store(&config);
    let state = Arc::new(AppState::from_config(&config, store)?);

    let lifecycle = state.lifecycle.clone();
    tokio::spawn(async move {
        lifecycle.start().await;
    });

    let listener = TcpListener::bind(&config.listen).await?;
    info!(addr = %listener.local_addr()?, upstream = %config.upstream_url, "Portico gateway listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Portico gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
