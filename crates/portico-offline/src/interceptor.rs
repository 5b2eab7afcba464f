//! Network-first fetch interception.

use crate::metrics::WorkerMetrics;
use crate::policy::InterceptPolicy;
use portico_core::cache::{CacheKey, CachePartitions, ResponseSnapshot};
use portico_core::classify::{BypassReason, RequestClassification};
use portico_core::ports::{CacheStore, Network};
use portico_core::request::FetchRequest;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Root document served for an offline navigation.
    OfflineFallback,
    /// Synthetic response; nothing could answer.
    NetworkError,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::OfflineFallback => "offline-fallback",
            ResponseSource::NetworkError => "network-error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
}

/// Outcome of intercepting a request.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Not ours; the caller talks to the network directly.
    Bypass(BypassReason),
    Respond(Served),
}

pub struct FetchInterceptor {
    policy: InterceptPolicy,
    partitions: CachePartitions,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    metrics: Arc<WorkerMetrics>,
}

impl FetchInterceptor {
    pub fn new(
        policy: InterceptPolicy,
        partitions: CachePartitions,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            policy,
            partitions,
            store,
            network,
            metrics,
        }
    }

    pub fn policy(&self) -> &InterceptPolicy {
        &self.policy
    }

    pub async fn handle(&self, request: &FetchRequest) -> Interception {
        let classification = self.policy.classify(request);
        if let RequestClassification::Bypass(reason) = classification {
            debug!(url = %request.url, ?reason, "Bypassing offline cache");
            self.metrics.record_bypass();
            return Interception::Bypass(reason);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.metrics.record_network_response();
                if let Some(entry) = storable(request, &response) {
                    self.store_in_background(request.cache_key(), entry);
                }
                Interception::Respond(Served {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed, trying cache");
                self.metrics.record_network_failure();
                Interception::Respond(self.fallback(request, classification).await)
            }
        }
    }

    /// Write to the runtime partition without holding up the response.
    fn store_in_background(&self, key: CacheKey, response: ResponseSnapshot) {
        let store = Arc::clone(&self.store);
        let metrics = Arc::clone(&self.metrics);
        let runtime = self.partitions.runtime.clone();

        tokio::spawn(async move {
            match store.put(&runtime, &key, &response).await {
                Ok(()) => {
                    metrics.record_cache_write();
                    debug!(key = %key, "Cached runtime response");
                }
                Err(e) => {
                    metrics.record_cache_write_failure();
                    warn!(key = %key, error = %e, "Cache put failed");
                }
            }
        });
    }

    async fn fallback(&self, request: &FetchRequest, classification: RequestClassification) -> Served {
        if let Some(cached) = self.lookup(&request.cache_key()).await {
            info!(url = %request.url, "Serving from cache");
            self.metrics.record_cache_hit();
            return Served {
                response: cached,
                source: ResponseSource::Cache,
            };
        }

        if classification == RequestClassification::Navigable {
            let root = CacheKey::get(&self.policy.root_url()).with_scope(request.cache_scope());
            if let Some(landing) = self.lookup(&root).await {
                info!(url = %request.url, "Serving offline landing page");
                self.metrics.record_offline_fallback();
                return Served {
                    response: landing,
                    source: ResponseSource::OfflineFallback,
                };
            }
        }

        self.metrics.record_network_error();
        Served {
            response: ResponseSnapshot::network_error(),
            source: ResponseSource::NetworkError,
        }
    }

    /// Entries stored under the caller's scope win over public ones.
    async fn lookup(&self, key: &CacheKey) -> Option<ResponseSnapshot> {
        if key.is_scoped() {
            if let Some(hit) = self.lookup_exact(key).await {
                return Some(hit);
            }
            return self.lookup_exact(&key.public()).await;
        }
        self.lookup_exact(key).await
    }

    /// A failing read counts as a miss.
    async fn lookup_exact(&self, key: &CacheKey) -> Option<ResponseSnapshot> {
        match self.store.match_in(&self.partitions.lookup_order(), key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        }
    }
}

/// The copy of `response` that may go into the runtime partition, if any.
///
/// Only 200 GETs are kept. `no-store` is never kept, and `private` only under
/// a credential scope. Cookies set by the upstream are never replayed.
fn storable(request: &FetchRequest, response: &ResponseSnapshot) -> Option<ResponseSnapshot> {
    if !response.is_ok() || !request.is_get() {
        return None;
    }
    if response.has_cache_directive("no-store") {
        return None;
    }
    if response.has_cache_directive("private") && request.cache_scope().is_none() {
        return None;
    }
    Some(response.clone().without_header("set-cookie"))
}
