//! Test context providing access to all test infrastructure.

use portico_cache::FilesystemStore;
use portico_core::cache::{CacheKey, CacheName};
use portico_core::ports::CacheStore;
use portico_core::session::credential_scope;
use portico_gateway::{AppState, GatewayConfig};
use portico_offline::{ActivateReport, InstallReport};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

use crate::fixtures::{PortalFixture, TEST_ORIGIN, test_config};
use crate::helpers::{ApiTestClient, start_test_server, wait_for};
use crate::network::SwitchableNetwork;

/// A running gateway with fake upstream and backend.
///
/// Drop this to stop the servers and remove the cache directory.
pub struct TestContext {
    pub upstream: MockServer,
    pub backend: MockServer,
    pub config: GatewayConfig,
    pub store: Arc<FilesystemStore>,
    pub network: Arc<SwitchableNetwork>,
    pub state: Arc<AppState>,
    pub client: ApiTestClient,
    pub addr: SocketAddr,
    cache_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl TestContext {
    /// Gateway with default settings and the portal shell mounted upstream.
    /// The offline layer is not installed yet; see [`TestContext::activate`].
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut GatewayConfig)) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let (upstream, backend) = tokio::join!(MockServer::start(), MockServer::start());
        PortalFixture::mount_shell(&upstream).await;

        let cache_dir = tempfile::tempdir()?;
        let mut config = test_config(&upstream, &backend, cache_dir.path());
        customize(&mut config);

        let store = Arc::new(FilesystemStore::new(cache_dir.path().to_path_buf()));
        let network = Arc::new(SwitchableNetwork::new(
            config.origin_url()?,
            config.upstream()?,
        )?);
        let state = Arc::new(AppState::with_network(
            &config,
            store.clone(),
            network.clone(),
        )?);

        let (addr, handle) = start_test_server(state.clone()).await?;

        Ok(Self {
            upstream,
            backend,
            config,
            store,
            network,
            state,
            client: ApiTestClient::new(addr),
            addr,
            cache_dir,
            handle,
        })
    }

    /// Install and, unless told to wait, activate the offline layer.
    pub async fn activate(&self) -> (InstallReport, Option<ActivateReport>) {
        self.state.lifecycle.start().await
    }

    pub fn go_offline(&self) {
        self.network.set_offline(true);
    }

    pub fn go_online(&self) {
        self.network.set_offline(false);
    }

    pub fn cache_dir(&self) -> &std::path::Path {
        self.cache_dir.path()
    }

    pub fn install_cache(&self) -> CacheName {
        self.config.partitions().install
    }

    pub fn runtime_cache(&self) -> CacheName {
        self.config.partitions().runtime
    }

    /// Cache key for an anonymous same-origin GET.
    pub fn key(&self, path: &str) -> CacheKey {
        let url = Url::parse(TEST_ORIGIN)
            .and_then(|origin| origin.join(path))
            .expect("valid test path");
        CacheKey::get(&url)
    }

    /// Cache key for a same-origin GET made with session `token`.
    pub fn key_as(&self, path: &str, token: &str) -> CacheKey {
        self.key(path).with_scope(Some(credential_scope(token)))
    }

    /// Wait until the background cache write for `key` has landed.
    pub async fn wait_for_runtime_entry(&self, key: &CacheKey) -> bool {
        let name = self.runtime_cache();
        let key = key.clone();
        wait_for(Duration::from_secs(2), Duration::from_millis(20), || {
            let store = self.store.clone();
            let name = name.clone();
            let key = key.clone();
            async move { matches!(store.get(&name, &key).await, Ok(Some(_))) }
        })
        .await
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
