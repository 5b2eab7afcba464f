//! HTTP middleware for the gateway.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gate::GateDecision;
use crate::handlers::session_from;
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inject request ID into each request, keeping one the caller sent.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("invalid"))
        });
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);

    response
}

/// Session gate in front of the portal routes.
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.gate.is_excluded(&path) {
        return next.run(request).await;
    }

    let session = session_from(&jar, state.gate.session_cookie());

    match state.gate.decide(&path, session.as_ref()) {
        GateDecision::Forward => {
            debug!(path = %path, signed_in = session.is_some(), "Gate passed");
            next.run(request).await
        }
        GateDecision::Redirect(location) => {
            info!(path = %path, location = %location, "Gate redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}
