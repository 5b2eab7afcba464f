//! Application state shared across handlers.

use portico_cache::{FilesystemStore, MemoryStore};
use portico_core::Result;
use portico_core::ports::{CacheStore, Network};
use portico_offline::{FetchInterceptor, HttpNetwork, LifecycleController, WorkerMetrics};
use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::GatewayConfig;
use crate::gate::AuthGate;

pub struct AppState {
    pub gate: AuthGate,
    pub interceptor: FetchInterceptor,
    pub lifecycle: Arc<LifecycleController>,
    pub network: Arc<dyn Network>,
    pub backend: BackendClient,
    pub metrics: Arc<WorkerMetrics>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wire the gateway from configuration over the given cache store.
    pub fn from_config(config: &GatewayConfig, store: Arc<dyn CacheStore>) -> Result<Self> {
        let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(
            config.origin_url()?,
            config.upstream()?,
            config.request_timeout(),
        )?);
        Self::with_network(config, store, network)
    }

    pub fn with_network(
        config: &GatewayConfig,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
    ) -> Result<Self> {
        let policy = config.intercept_policy()?;
        let metrics = WorkerMetrics::new();

        let interceptor = FetchInterceptor::new(
            policy.clone(),
            config.partitions(),
            store.clone(),
            network.clone(),
            metrics.clone(),
        );
        let lifecycle = Arc::new(LifecycleController::new(
            config.lifecycle_config(),
            policy,
            store,
            network.clone(),
            metrics.clone(),
        ));

        Ok(Self {
            gate: AuthGate::new(config.gate.clone())?,
            interceptor,
            lifecycle,
            network,
            backend: BackendClient::new(config.backend()?, config.request_timeout())?,
            metrics,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Filesystem store when a cache dir is configured, memory otherwise.
pub fn build_store(config: &GatewayConfig) -> Arc<dyn CacheStore> {
    match &config.cache.dir {
        Some(dir) => Arc::new(FilesystemStore::new(dir.clone())),
        None => Arc::new(MemoryStore::new()),
    }
}
