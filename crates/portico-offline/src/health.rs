//! Health of the offline layer.

use crate::lifecycle::WorkerState;
use crate::metrics::MetricsSnapshot;
use serde::Serialize;

/// Health status of the offline layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Activated, nothing degraded.
    Healthy,
    /// Serving, but with fewer assets cached than configured.
    Degraded { reason: String },
    /// Not serving under the current version yet.
    Unhealthy { reason: String },
}

impl HealthStatus {
    /// Check if the status is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Check if the service is operational (healthy or degraded).
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }
}

/// Health check result with details.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub state: WorkerState,
    /// Manifest entries the latest install could not cache.
    pub missing_precache: usize,
    pub metrics: MetricsSnapshot,
}

impl HealthCheck {
    /// `missing_precache` comes from the latest install; the counters in
    /// `metrics` are lifetime totals.
    pub fn evaluate(state: WorkerState, missing_precache: usize, metrics: MetricsSnapshot) -> Self {
        let status = if state != WorkerState::Activated {
            HealthStatus::Unhealthy {
                reason: format!("Worker is {}", state),
            }
        } else if missing_precache > 0 {
            HealthStatus::Degraded {
                reason: format!(
                    "{} manifest entries could not be pre-cached",
                    missing_precache
                ),
            }
        } else if metrics.cache_write_failures > 0 {
            HealthStatus::Degraded {
                reason: format!(
                    "{} runtime cache writes failed",
                    metrics.cache_write_failures
                ),
            }
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            state,
            missing_precache,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_activated_is_unhealthy() {
        let check = HealthCheck::evaluate(WorkerState::Installing, 0, MetricsSnapshot::default());
        assert!(!check.status.is_operational());
    }

    #[test]
    fn test_precache_failures_degrade() {
        let metrics = MetricsSnapshot {
            precache_failures: 2,
            ..Default::default()
        };
        let check = HealthCheck::evaluate(WorkerState::Activated, 2, metrics);
        assert!(check.status.is_operational());
        assert!(!check.status.is_healthy());
        assert_eq!(
            check.status,
            HealthStatus::Degraded {
                reason: "2 manifest entries could not be pre-cached".to_string()
            }
        );
    }

    #[test]
    fn test_activated_clean_is_healthy() {
        let check = HealthCheck::evaluate(WorkerState::Activated, 0, MetricsSnapshot::default());
        assert!(check.status.is_healthy());
    }

    #[test]
    fn test_earlier_failures_do_not_degrade_a_complete_install() {
        let metrics = MetricsSnapshot {
            precache_failures: 5,
            ..Default::default()
        };
        let check = HealthCheck::evaluate(WorkerState::Activated, 0, metrics);
        assert!(check.status.is_healthy());
        assert_eq!(check.metrics.precache_failures, 5);
    }
}
