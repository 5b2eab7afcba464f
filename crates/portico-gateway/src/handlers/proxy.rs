//! Portal pages and assets, served through the offline layer.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use portico_core::Result;
use portico_core::cache::ResponseSnapshot;
use portico_core::classify::BypassReason;
use portico_core::request::{FetchRequest, RequestMode};
use portico_offline::{InterceptPolicy, Interception, ResponseSource, is_hop_by_hop};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::{header_str, read_body, session_from};
use crate::state::AppState;

/// Where a response came from: `network`, `cache`, `offline-fallback`,
/// `network-error` or `bypass`.
pub const SOURCE_HEADER: &str = "x-portico-source";
/// Status text of the synthetic network-error response.
pub const STATUS_TEXT_HEADER: &str = "x-portico-status-text";

pub async fn forward(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match read_body(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let fetch = match fetch_request(&parts, body.to_vec(), state.interceptor.policy()) {
        Ok(fetch) => fetch.with_session(session_from(&jar, state.gate.session_cookie())),
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.interceptor.handle(&fetch).await {
        Interception::Respond(served) => {
            debug!(url = %fetch.url, source = served.source.as_str(), status = served.response.status, "Served");
            let status_text = (served.source == ResponseSource::NetworkError)
                .then(|| served.response.status_text.clone());
            snapshot_response(served.response, served.source.as_str(), status_text)
        }
        Interception::Bypass(BypassReason::CrossOrigin) => (
            StatusCode::MISDIRECTED_REQUEST,
            "Cross-origin requests are not proxied",
        )
            .into_response(),
        Interception::Bypass(reason) => match state.network.fetch(&fetch).await {
            Ok(response) => snapshot_response(response, "bypass", None),
            Err(e) => {
                warn!(url = %fetch.url, reason = ?reason, error = %e, "Bypassed request failed");
                (StatusCode::BAD_GATEWAY, "Upstream unavailable").into_response()
            }
        },
    }
}

/// Build the interceptor's view of an incoming request.
fn fetch_request(parts: &Parts, body: Vec<u8>, policy: &InterceptPolicy) -> Result<FetchRequest> {
    let url = match (parts.uri.scheme_str(), parts.uri.authority()) {
        (Some(_), Some(_)) => Url::parse(&parts.uri.to_string())?,
        _ => {
            let path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
            policy.resolve(path)?
        }
    };

    let method = parts.method.as_str();
    let mode = RequestMode::detect(
        method,
        header_str(&parts.headers, "sec-fetch-mode"),
        header_str(&parts.headers, "accept"),
    );

    let mut fetch = FetchRequest::new(method, url).with_mode(mode).with_body(body);
    for (name, value) in &parts.headers {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            fetch = fetch.with_header(name.as_str(), value);
        }
    }
    Ok(fetch)
}

fn snapshot_response(
    snapshot: ResponseSnapshot,
    source: &str,
    status_text: Option<String>,
) -> Response {
    let status = StatusCode::from_u16(snapshot.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    for (name, value) in &snapshot.headers {
        if !is_hop_by_hop(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder = builder.header(SOURCE_HEADER, source);
    if let Some(text) = status_text {
        builder = builder.header(STATUS_TEXT_HEADER, text);
    }

    builder.body(Body::from(snapshot.body)).unwrap_or_else(|e| {
        warn!(error = %e, "Unrepresentable upstream response");
        StatusCode::BAD_GATEWAY.into_response()
    })
}
