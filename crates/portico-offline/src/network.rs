//! HTTP transport for the offline layer.

use async_trait::async_trait;
use portico_core::cache::ResponseSnapshot;
use portico_core::ports::Network;
use portico_core::request::FetchRequest;
use portico_core::{Error, Result};
use reqwest::{Client, Method, redirect};
use std::time::Duration;
use url::Url;

/// Headers that describe one connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Fetches same-origin URLs from the upstream page server and everything
/// else from its own origin. Redirects are returned, not followed.
pub struct HttpNetwork {
    client: Client,
    origin: Url,
    upstream: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, upstream: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            origin,
            upstream,
        })
    }

    /// Where a request for `url` is actually sent.
    pub fn target_url(&self, url: &Url) -> Url {
        if url.origin() != self.origin.origin() {
            return url.clone();
        }

        let mut target = self.upstream.clone();
        let base = self.upstream.path().trim_end_matches('/');
        target.set_path(&format!("{}{}", base, url.path()));
        target.set_query(url.query());
        target
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::Network(format!("Invalid method {}: {}", request.method, e)))?;
        let target = self.target_url(&request.url);

        let mut builder = self.client.request(method, target.clone());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} {}: {}", request.method, target, e)))?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read body from {}: {}", target, e)))?;

        let mut snapshot = ResponseSnapshot::new(status.as_u16(), body.to_vec())
            .with_status_text(status.canonical_reason().unwrap_or_default());
        snapshot.headers = headers;
        Ok(snapshot)
    }
}
