//! Route definitions.

use axum::{
    Router, middleware,
    routing::{any, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, health, messages, proxy};
use crate::middleware::{auth_gate, request_id};
use crate::state::AppState;

/// Create the gateway router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/__portico", control_routes())
        .merge(portal_routes(state.clone()))
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn control_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", post(messages::register_client))
        .route(
            "/clients/{id}",
            post(messages::touch_client).delete(messages::unregister_client),
        )
        .route("/message", post(messages::post_message))
        .route("/status", get(messages::status))
}

/// Everything the page sees, behind the session gate.
fn portal_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/{*path}", any(api::forward))
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(state, auth_gate))
}
