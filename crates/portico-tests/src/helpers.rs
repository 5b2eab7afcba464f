//! Test helper functions and utilities.

use portico_gateway::{AppState, build_app};
use reqwest::{Client, redirect};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Start a gateway for testing and return its address.
pub async fn start_test_server(
    state: Arc<AppState>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((addr, handle))
}

/// Create an HTTP client for testing. Redirects are surfaced, not followed.
pub fn test_client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create test client")
}

/// Gateway test client with base URL.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            client: test_client(),
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    /// GET with a session cookie.
    pub async fn get_as(&self, path: &str, token: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(self.url(path))
            .header("cookie", format!("auth_token={}", token))
            .send()
            .await
    }

    /// Page load with a session cookie, the way a browser navigates.
    pub async fn navigate_as(&self, path: &str, token: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(self.url(path))
            .header("cookie", format!("auth_token={}", token))
            .header("sec-fetch-mode", "navigate")
            .header("accept", "text/html")
            .send()
            .await
    }

    pub async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).json(body).send().await
    }

    /// Check health endpoint.
    pub async fn health(&self) -> anyhow::Result<bool> {
        let resp = self.get("/health").await?;
        Ok(resp.status().is_success())
    }

    /// Check readiness endpoint.
    pub async fn ready(&self) -> anyhow::Result<bool> {
        let resp = self.get("/ready").await?;
        Ok(resp.status().is_success())
    }
}

/// Wait for a condition with timeout.
pub async fn wait_for<F, Fut>(
    timeout: std::time::Duration,
    interval: std::time::Duration,
    mut condition: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Assert that a future completes within a timeout.
pub async fn assert_completes_within<F, T>(future: F, timeout: std::time::Duration) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .expect("Operation timed out")
}
