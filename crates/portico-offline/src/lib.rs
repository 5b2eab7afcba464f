//! Network-first offline cache layer for Portico.
//!
//! [`FetchInterceptor`] decides per request between network and cache;
//! [`LifecycleController`] primes the install partition, retires stale
//! partitions and takes over page clients.

pub mod clients;
pub mod health;
pub mod interceptor;
pub mod lifecycle;
pub mod manifest;
pub mod metrics;
pub mod network;
pub mod policy;

#[cfg(test)]
pub(crate) mod test_support;

pub use clients::{ClientLimits, ClientRegistration, ClientRegistry};
pub use health::{HealthCheck, HealthStatus};
pub use interceptor::{FetchInterceptor, Interception, ResponseSource, Served};
pub use lifecycle::{
    ActivateReport, InstallReport, LifecycleConfig, LifecycleController, PrecacheFailure,
    WorkerState,
};
pub use manifest::PrecacheManifest;
pub use metrics::{MetricsSnapshot, WorkerMetrics};
pub use network::{HttpNetwork, is_hop_by_hop};
pub use policy::InterceptPolicy;
