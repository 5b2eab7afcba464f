//! Backend API proxy.

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::{header_str, read_body, session_from};
use crate::backend::BackendRequest;
use crate::state::AppState;

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

    let session = session_from(&jar, state.gate.session_cookie());

    let backend_request = BackendRequest {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string()),
        content_type: header_str(&parts.headers, "content-type").map(str::to_string),
        authorization: header_str(&parts.headers, "authorization").map(str::to_string),
        body: body.to_vec(),
    };

    match state.backend.forward(backend_request, session.as_ref()).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut builder = Response::builder().status(status);
            if let Some(content_type) = response.content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            builder
                .body(Body::from(response.body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(e) => {
            error!(path = %parts.uri.path(), error = %e, "Backend proxy error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}
