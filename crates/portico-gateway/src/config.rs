//! Gateway configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional YAML/TOML
//! file, then `PORTICO__*` environment variables (`__` separates nesting,
//! e.g. `PORTICO__CACHE__DIR=/var/cache/portico`).

use portico_core::cache::CachePartitions;
use portico_core::{Error, Result};
use portico_offline::{ClientLimits, InterceptPolicy, LifecycleConfig, PrecacheManifest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Socket address to listen on.
    pub listen: String,
    /// Public origin of the portal. Defaults to the upstream origin.
    pub origin: Option<String>,
    /// Page server the offline layer fetches from.
    pub upstream_url: String,
    /// REST backend behind `/api/*`.
    pub backend_url: String,
    /// Transport timeout for upstream and backend calls. None = no timeout.
    pub request_timeout_secs: Option<u64>,
    /// Largest request body accepted for forwarding.
    pub max_body_bytes: usize,
    pub cache: CacheSettings,
    pub interceptor: InterceptorSettings,
    pub gate: GateSettings,
    pub clients: ClientSettings,
    pub log: LogSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            origin: None,
            upstream_url: "http://localhost:3001".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_secs: None,
            max_body_bytes: 10 * 1024 * 1024,
            cache: CacheSettings::default(),
            interceptor: InterceptorSettings::default(),
            gate: GateSettings::default(),
            clients: ClientSettings::default(),
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// On-disk cache root. Without it, caches live in memory.
    pub dir: Option<PathBuf>,
    pub install_cache: String,
    pub runtime_cache: String,
    /// Paths primed into the install cache.
    pub precache: Vec<String>,
    pub skip_waiting_on_install: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let partitions = CachePartitions::default();
        Self {
            dir: None,
            install_cache: partitions.install.to_string(),
            runtime_cache: partitions.runtime.to_string(),
            precache: PrecacheManifest::default().paths().to_vec(),
            skip_waiting_on_install: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSettings {
    pub api_prefix: String,
    /// Path fragments marking auth-flow pages, which are never cached.
    pub auth_markers: Vec<String>,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            auth_markers: vec!["/login".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub session_cookie: String,
    /// Exact-match allow-list.
    pub public_paths: Vec<String>,
    /// Public pages a signed-in user is sent away from.
    pub auth_form_paths: Vec<String>,
    pub login_path: String,
    pub landing_path: String,
    pub redirect_param: String,
    pub api_prefix: String,
    pub asset_prefixes: Vec<String>,
    pub asset_extensions: Vec<String>,
    /// Regexes for paths the gate never sees.
    pub excluded_patterns: Vec<String>,
}

impl Default for GateSettings {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            session_cookie: "auth_token".to_string(),
            public_paths: strings(&["/", "/login", "/register"]),
            auth_form_paths: strings(&["/login", "/register"]),
            login_path: "/login".to_string(),
            landing_path: "/dashboard/citizen".to_string(),
            redirect_param: "redirect".to_string(),
            api_prefix: "/api/".to_string(),
            asset_prefixes: strings(&["/_next", "/static"]),
            asset_extensions: strings(&["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]),
            excluded_patterns: strings(&[
                r"^/_next/static",
                r"^/_next/image",
                r"^/favicon\.ico",
                r"\.(svg|png|jpg|jpeg|gif|webp)$",
            ]),
        }
    }
}

/// Bounds on the page-client registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub max_clients: usize,
    pub idle_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let limits = ClientLimits::default();
        Self {
            max_clients: limits.max_clients,
            idle_timeout_secs: limits.idle_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("PORTICO")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn upstream(&self) -> Result<Url> {
        parse_url("upstream_url", &self.upstream_url)
    }

    pub fn backend(&self) -> Result<Url> {
        parse_url("backend_url", &self.backend_url)
    }

    pub fn origin_url(&self) -> Result<Url> {
        match &self.origin {
            Some(origin) => parse_url("origin", origin),
            None => self.upstream(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn partitions(&self) -> CachePartitions {
        CachePartitions::new(&self.cache.install_cache, &self.cache.runtime_cache)
    }

    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            partitions: self.partitions(),
            manifest: PrecacheManifest::new(self.cache.precache.clone()),
            skip_waiting_on_install: self.cache.skip_waiting_on_install,
            client_limits: ClientLimits {
                max_clients: self.clients.max_clients,
                idle_timeout: Duration::from_secs(self.clients.idle_timeout_secs),
            },
        }
    }

    pub fn intercept_policy(&self) -> Result<InterceptPolicy> {
        Ok(InterceptPolicy::new(self.origin_url()?)
            .with_api_prefix(&self.interceptor.api_prefix)
            .with_auth_markers(self.interceptor.auth_markers.clone()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config(format!("Invalid {} {:?}: {}", field, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.gate.session_cookie, "auth_token");
        assert_eq!(config.cache.precache.len(), 7);
        assert_eq!(
            config.origin_url().unwrap().as_str(),
            "http://localhost:3001/"
        );
        assert_eq!(config.partitions(), CachePartitions::default());
    }

    #[test]
    fn test_load_from_file_keeps_unset_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "origin: https://portal.example\nupstream_url: http://pages:3001\ncache:\n  install_cache: portal-v7\ngate:\n  landing_path: /dashboard/home"
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.origin.as_deref(), Some("https://portal.example"));
        assert_eq!(config.cache.install_cache, "portal-v7");
        assert_eq!(config.cache.runtime_cache, "portal-runtime");
        assert_eq!(config.gate.landing_path, "/dashboard/home");
        assert_eq!(config.gate.login_path, "/login");
    }

    #[test]
    fn test_client_limits_reach_lifecycle() {
        let mut config = GatewayConfig::default();
        config.clients.max_clients = 16;
        config.clients.idle_timeout_secs = 90;

        let limits = config.lifecycle_config().client_limits;
        assert_eq!(limits.max_clients, 16);
        assert_eq!(limits.idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = GatewayConfig::load(Some(Path::new("/nonexistent/portico.yaml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let config = GatewayConfig {
            upstream_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.upstream(), Err(Error::Config(_))));
    }
}
