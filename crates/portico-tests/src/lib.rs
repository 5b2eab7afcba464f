//! Integration test infrastructure for Portico.
//!
//! A [`TestContext`] runs the real gateway on a loopback port, in front of
//! wiremock servers standing in for the page server and the REST backend,
//! with the offline cache on a temporary directory.
//!
//! # Usage
//!
//! ```ignore
//! use portico_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     ctx.activate().await;
//!     // Use ctx.client, ctx.upstream, ctx.store, ctx.go_offline(), etc.
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;
pub mod network;

pub use context::TestContext;
pub use fixtures::*;
pub use helpers::*;
pub use network::SwitchableNetwork;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,portico_offline=debug,portico_gateway=debug")),
        )
        .with_test_writer()
        .try_init();
}
