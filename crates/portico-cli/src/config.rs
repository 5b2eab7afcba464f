//! CLI configuration loading.

use anyhow::{Context, Result};
use portico_cache::default_cache_dir;
use portico_gateway::GatewayConfig;
use std::path::{Path, PathBuf};

/// Load the gateway configuration the CLI runs with.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig> {
    GatewayConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })
}

/// Cache root used by the cache commands.
pub fn cache_dir(config: &GatewayConfig) -> PathBuf {
    config.cache.dir.clone().unwrap_or_else(default_cache_dir)
}
