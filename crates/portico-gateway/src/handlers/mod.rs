//! Request handlers organized by surface.

pub mod api;
pub mod health;
pub mod messages;
pub mod proxy;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use portico_core::session::SessionToken;
use tracing::warn;

/// Buffer a request body, rejecting it past `limit` bytes.
pub(crate) async fn read_body(body: Body, limit: usize) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        warn!(error = %e, limit, "Rejected request body");
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
    })
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Session presented in the `cookie_name` cookie, if any.
pub(crate) fn session_from(jar: &CookieJar, cookie_name: &str) -> Option<SessionToken> {
    jar.get(cookie_name)
        .and_then(|cookie| SessionToken::from_cookie_value(cookie.value()))
}
