//! Control surface for page clients.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use portico_core::cache::CacheName;
use portico_core::ids::ClientId;
use portico_offline::{ClientRegistration, HealthCheck, WorkerState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Messages a page can post to the offline layer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    SkipWaiting,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub accepted: bool,
    /// Whether this message activated a waiting version.
    pub activated: bool,
    pub state: WorkerState,
}

/// Unknown or malformed messages are a 400.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    message: Result<Json<ClientMessage>, JsonRejection>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let Json(message) = message.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;

    let activated = match message {
        ClientMessage::SkipWaiting => state.lifecycle.skip_waiting().await.is_some(),
    };

    Ok(Json(MessageResponse {
        accepted: true,
        activated,
        state: state.lifecycle.state().await,
    }))
}

pub async fn register_client(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ClientRegistration>) {
    let registration = state.lifecycle.register_client().await;
    (StatusCode::CREATED, Json(registration))
}

/// Heartbeat from a registered client. Expired or unknown clients get a 404
/// and register again.
pub async fn touch_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ClientId>,
) -> Result<Json<ClientRegistration>, StatusCode> {
    state
        .lifecycle
        .touch_client(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn unregister_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ClientId>,
) -> StatusCode {
    if state.lifecycle.unregister_client(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub install_cache: CacheName,
    pub runtime_cache: CacheName,
    pub clients: usize,
    pub health: HealthCheck,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let lifecycle = &state.lifecycle;
    let partitions = lifecycle.partitions();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        install_cache: partitions.install.clone(),
        runtime_cache: partitions.runtime.clone(),
        clients: lifecycle.client_count().await,
        health: lifecycle.health().await,
    })
}
