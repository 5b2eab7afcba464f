//! Install-time pre-cache manifest.

use serde::{Deserialize, Serialize};

/// Ordered same-origin paths primed into the install partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecacheManifest(Vec<String>);

impl PrecacheManifest {
    pub fn new(paths: Vec<String>) -> Self {
        Self(paths)
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PrecacheManifest {
    /// Root document, web-app manifest, icons and logo.
    fn default() -> Self {
        Self(
            [
                "/",
                "/manifest.json",
                "/icon-192x192.png",
                "/icon-512x512.png",
                "/icon-maskable-192x192.png",
                "/icon-maskable-512x512.png",
                "/logo.png",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}
