//! Request and path classifications.

use serde::{Deserialize, Serialize};

/// Why the offline layer stays out of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    CrossOrigin,
    ApiRoute,
    AuthFlow,
}

/// How the fetch interceptor treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum RequestClassification {
    /// Never read from or written to any partition.
    Bypass(BypassReason),
    /// Page load; eligible for the offline landing fallback.
    Navigable,
    /// Same-origin subresource; runtime-cached when it is a GET.
    CacheableAsset,
}

impl RequestClassification {
    pub fn is_bypass(&self) -> bool {
        matches!(self, RequestClassification::Bypass(_))
    }
}

/// How the auth gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathClassification {
    /// Exact match in the public allow-list.
    Public,
    /// API route or static asset; never gated.
    Bypassed,
    /// Everything else.
    Protected,
}

impl std::fmt::Display for PathClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PathClassification::Public => "public",
            PathClassification::Bypassed => "bypassed",
            PathClassification::Protected => "protected",
        };
        f.write_str(label)
    }
}
