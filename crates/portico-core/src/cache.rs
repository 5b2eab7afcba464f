//! Cache types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Status of the synthetic response produced when neither the network nor
/// the cache can answer.
pub const NETWORK_ERROR_STATUS: u16 = 408;
pub const NETWORK_ERROR_STATUS_TEXT: &str = "Network timeout";
pub const NETWORK_ERROR_BODY: &str = "Network error";

/// Name of a cache partition. Versioned by convention (`portal-v1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The two partitions owned by the running version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePartitions {
    /// Fixed-manifest partition primed at install time.
    pub install: CacheName,
    /// Partition filled from successful live responses.
    pub runtime: CacheName,
}

impl CachePartitions {
    pub fn new(install: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            install: CacheName::new(install),
            runtime: CacheName::new(runtime),
        }
    }

    /// Whether `name` belongs to the running version.
    pub fn is_current(&self, name: &CacheName) -> bool {
        name == &self.install || name == &self.runtime
    }

    /// Lookup order used for fallback reads.
    pub fn lookup_order(&self) -> [&CacheName; 2] {
        [&self.install, &self.runtime]
    }
}

impl Default for CachePartitions {
    fn default() -> Self {
        Self::new("portal-v1", "portal-runtime")
    }
}

/// Identity of a cached request: method plus absolute URL, and the
/// credential scope for responses fetched on behalf of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl CacheKey {
    pub fn new(method: &str, url: &Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.as_str().to_string(),
            scope: None,
        }
    }

    /// Key for a GET of `url`.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// The same request, as seen without credentials.
    pub fn public(&self) -> Self {
        self.clone().with_scope(None)
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if let Some(scope) = &self.scope {
            write!(f, " [{}]", scope)?;
        }
        Ok(())
    }
}

/// A buffered HTTP response, as received from the network or stored in a
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            stored_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// The synthetic response returned when nothing can answer a request.
    pub fn network_error() -> Self {
        Self::new(NETWORK_ERROR_STATUS, NETWORK_ERROR_BODY)
            .with_status_text(NETWORK_ERROR_STATUS_TEXT)
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether `Cache-Control` carries `directive` (e.g. `no-store`).
    pub fn has_cache_directive(&self, directive: &str) -> bool {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("cache-control"))
            .flat_map(|(_, v)| v.split(','))
            .any(|d| {
                let name = d.split('=').next().unwrap_or_default().trim();
                name.eq_ignore_ascii_case(directive)
            })
    }

    /// Drop every header called `name`.
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// Exactly 200, the only status the runtime cache accepts.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A stored key/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: ResponseSnapshot,
}
