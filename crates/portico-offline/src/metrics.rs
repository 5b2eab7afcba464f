//! Counters for the offline layer.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the interceptor and lifecycle.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Requests left to the network untouched.
    pub bypassed: AtomicU64,
    /// Responses delivered straight from the network (any status).
    pub network_responses: AtomicU64,
    /// Requests where no response arrived.
    pub network_failures: AtomicU64,
    /// Runtime cache writes that landed.
    pub cache_writes: AtomicU64,
    /// Runtime cache writes that failed.
    pub cache_write_failures: AtomicU64,
    /// Offline requests answered from a partition.
    pub cache_hits: AtomicU64,
    /// Offline navigations answered with the root document.
    pub offline_fallbacks: AtomicU64,
    /// Offline requests answered with the synthetic error.
    pub network_errors: AtomicU64,
    /// Manifest entries stored at install.
    pub precached: AtomicU64,
    /// Manifest entries that could not be stored at install.
    pub precache_failures: AtomicU64,
    /// Stale partitions removed at activation.
    pub partitions_deleted: AtomicU64,
}

impl WorkerMetrics {
    /// Create new metrics instance.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_response(&self) {
        self.network_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_write(&self) {
        self.cache_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offline_fallback(&self) {
        self.offline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_error(&self) {
        self.network_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_precached(&self) {
        self.precached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_precache_failure(&self) {
        self.precache_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partition_deleted(&self) {
        self.partitions_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bypassed: self.bypassed.load(Ordering::Relaxed),
            network_responses: self.network_responses.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            offline_fallbacks: self.offline_fallbacks.load(Ordering::Relaxed),
            network_errors: self.network_errors.load(Ordering::Relaxed),
            precached: self.precached.load(Ordering::Relaxed),
            precache_failures: self.precache_failures.load(Ordering::Relaxed),
            partitions_deleted: self.partitions_deleted.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub bypassed: u64,
    pub network_responses: u64,
    pub network_failures: u64,
    pub cache_writes: u64,
    pub cache_write_failures: u64,
    pub cache_hits: u64,
    pub offline_fallbacks: u64,
    pub network_errors: u64,
    pub precached: u64,
    pub precache_failures: u64,
    pub partitions_deleted: u64,
}
