//! Install → activate lifecycle of the offline layer.
//!
//! Install primes the install partition from the manifest, best effort.
//! Activate deletes every partition the running version does not own and
//! takes over registered page clients. Neither phase can fail: storage and
//! network errors degrade the cache, they never block an update.

use crate::clients::{ClientLimits, ClientRegistration, ClientRegistry};
use crate::health::HealthCheck;
use crate::manifest::PrecacheManifest;
use crate::metrics::WorkerMetrics;
use crate::policy::InterceptPolicy;
use portico_core::cache::{CacheName, CachePartitions};
use portico_core::ids::ClientId;
use portico_core::ports::{CacheStore, Network};
use portico_core::request::FetchRequest;
use portico_core::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Lifecycle phase of the running version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub partitions: CachePartitions,
    pub manifest: PrecacheManifest,
    /// Activate right after install instead of waiting for a signal.
    pub skip_waiting_on_install: bool,
    pub client_limits: ClientLimits,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            partitions: CachePartitions::default(),
            manifest: PrecacheManifest::default(),
            skip_waiting_on_install: true,
            client_limits: ClientLimits::default(),
        }
    }
}

/// A manifest entry that could not be pre-cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<CacheName>,
    pub claimed: usize,
}

pub struct LifecycleController {
    config: LifecycleConfig,
    policy: InterceptPolicy,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    metrics: Arc<WorkerMetrics>,
    clients: ClientRegistry,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    /// Manifest entries missing after the latest install.
    missing_precache: AtomicUsize,
    /// Serializes install and activate.
    phase: Mutex<()>,
}

impl LifecycleController {
    pub fn new(
        config: LifecycleConfig,
        policy: InterceptPolicy,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        let clients = ClientRegistry::with_limits(config.client_limits);
        Self {
            config,
            policy,
            store,
            network,
            metrics,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            missing_precache: AtomicUsize::new(0),
            phase: Mutex::new(()),
        }
    }

    pub fn partitions(&self) -> &CachePartitions {
        &self.config.partitions
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.config.manifest
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub async fn is_active(&self) -> bool {
        self.state().await == WorkerState::Activated
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Install, then activate unless the version has to wait for a signal.
    pub async fn start(&self) -> (InstallReport, Option<ActivateReport>) {
        let installed = self.install().await;
        if self.skip_waiting.load(Ordering::SeqCst) {
            let activated = self.activate().await;
            (installed, Some(activated))
        } else {
            info!("Installed; waiting for skip-waiting signal");
            (installed, None)
        }
    }

    /// Prime the install partition. Individual failures drop only that entry.
    pub async fn install(&self) -> InstallReport {
        let _phase = self.phase.lock().await;
        self.set_state(WorkerState::Installing).await;

        let install = &self.config.partitions.install;
        info!(partition = %install, entries = self.config.manifest.len(), "Installing offline cache");

        let mut report = InstallReport::default();
        match self.store.open(install).await {
            Ok(()) => {
                for path in self.config.manifest.paths() {
                    match self.precache(path).await {
                        Ok(()) => {
                            self.metrics.record_precached();
                            report.cached.push(path.clone());
                        }
                        Err(e) => {
                            warn!(path = %path, error = %e, "Failed to pre-cache manifest entry");
                            self.metrics.record_precache_failure();
                            report.failed.push(PrecacheFailure {
                                path: path.clone(),
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
            Err(e) => {
                warn!(partition = %install, error = %e, "Failed to open install cache; skipping pre-cache");
                for path in self.config.manifest.paths() {
                    self.metrics.record_precache_failure();
                    report.failed.push(PrecacheFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.missing_precache
            .store(report.failed.len(), Ordering::SeqCst);
        self.set_state(WorkerState::Installed).await;
        info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Install finished"
        );

        if self.config.skip_waiting_on_install {
            debug!("Skipping waiting");
            self.skip_waiting.store(true, Ordering::SeqCst);
        }

        report
    }

    async fn precache(&self, path: &str) -> Result<()> {
        let request = FetchRequest::get(self.policy.resolve(path)?);
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::Network(format!(
                "Unexpected status {} for {}",
                response.status, request.url
            )));
        }
        self.store
            .put(&self.config.partitions.install, &request.cache_key(), &response)
            .await
    }

    /// Retire stale partitions and claim page clients.
    pub async fn activate(&self) -> ActivateReport {
        let _phase = self.phase.lock().await;
        self.set_state(WorkerState::Activating).await;
        info!("Activating offline cache");

        let partitions = &self.config.partitions;
        let mut report = ActivateReport::default();

        match self.store.prune_orphans(&partitions.lookup_order()).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed unreadable cache partitions"),
            Err(e) => warn!(error = %e, "Failed to prune cache partitions"),
        }

        match self.store.partitions().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| !partitions.is_current(n)) {
                    match self.store.delete(&name).await {
                        Ok(true) => {
                            info!(partition = %name, "Deleted old cache");
                            self.metrics.record_partition_deleted();
                            report.deleted.push(name);
                        }
                        Ok(false) => {}
                        Err(e) => warn!(partition = %name, error = %e, "Failed to delete old cache"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to list cache partitions"),
        }

        report.claimed = self.clients.claim(&partitions.install).await;
        self.set_state(WorkerState::Activated).await;
        info!(
            deleted = report.deleted.len(),
            claimed = report.claimed,
            "Activated; claimed clients"
        );

        report
    }

    /// Handle a skip-waiting signal from a page client. Returns the
    /// activation report when the signal activated a waiting version.
    pub async fn skip_waiting(&self) -> Option<ActivateReport> {
        info!("Received skip-waiting signal");
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.state().await == WorkerState::Installed {
            Some(self.activate().await)
        } else {
            None
        }
    }

    /// Register a page client; it is controlled right away once activated.
    pub async fn register_client(&self) -> ClientRegistration {
        let controller = if self.is_active().await {
            Some(self.config.partitions.install.clone())
        } else {
            None
        };
        self.clients.register(controller).await
    }

    /// Keep a registered client alive; `None` once it has expired.
    pub async fn touch_client(&self, id: &ClientId) -> Option<ClientRegistration> {
        self.clients.touch(id).await
    }

    pub async fn unregister_client(&self, id: &ClientId) -> bool {
        self.clients.unregister(id).await
    }

    pub async fn controller_of(&self, id: &ClientId) -> Option<Option<CacheName>> {
        self.clients.controller_of(id).await
    }

    pub async fn client_count(&self) -> usize {
        self.clients.len().await
    }

    /// Health as of the latest install.
    pub async fn health(&self) -> HealthCheck {
        HealthCheck::evaluate(
            self.state().await,
            self.missing_precache.load(Ordering::SeqCst),
            self.metrics.snapshot(),
        )
    }
}
