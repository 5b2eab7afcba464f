//! Fixtures for the fake page server and gateway configuration.

use portico_gateway::GatewayConfig;
use portico_offline::PrecacheManifest;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Public origin the test gateway claims.
pub const TEST_ORIGIN: &str = "https://portal.example";

/// Body of the root document served by [`PortalFixture`].
pub const ROOT_DOCUMENT: &str = "<html><body><h1>Citizen Portal</h1></body></html>";

/// Factory for the page server's content.
pub struct PortalFixture;

impl PortalFixture {
    /// Serve every entry of the default pre-cache manifest.
    pub async fn mount_shell(server: &MockServer) {
        for entry in PrecacheManifest::default().paths() {
            let response = if entry == "/" {
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(ROOT_DOCUMENT)
            } else if entry.ends_with(".json") {
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/manifest+json")
                    .set_body_string(r#"{"name":"Citizen Portal"}"#)
            } else {
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
            };
            Mock::given(method("GET"))
                .and(path(entry.as_str()))
                .respond_with(response)
                .mount(server)
                .await;
        }
    }

    /// Serve an HTML page at `page_path`.
    pub async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    pub async fn mount_status(server: &MockServer, page_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }
}

/// Configuration pointing the gateway at the given fakes.
pub fn test_config(upstream: &MockServer, backend: &MockServer, cache_dir: &Path) -> GatewayConfig {
    let mut config = GatewayConfig {
        listen: "127.0.0.1:0".to_string(),
        origin: Some(TEST_ORIGIN.to_string()),
        upstream_url: upstream.uri(),
        backend_url: backend.uri(),
        request_timeout_secs: Some(5),
        ..Default::default()
    };
    config.cache.dir = Some(cache_dir.to_path_buf());
    config
}
