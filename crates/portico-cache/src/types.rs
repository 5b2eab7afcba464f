//! On-disk formats and summaries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use portico_core::cache::{CacheEntry, CacheKey, CacheName, ResponseSnapshot};
use portico_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Entry file contents. The body is base64 so the file stays valid JSON for
/// binary assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: CacheKey,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn encode(key: &CacheKey, response: &ResponseSnapshot) -> Self {
        Self {
            key: key.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: STANDARD.encode(&response.body),
            stored_at: response.stored_at,
        }
    }

    pub fn decode(self) -> Result<CacheEntry> {
        let body = STANDARD
            .decode(self.body.as_bytes())
            .map_err(|e| Error::CacheRead(format!("Corrupt body for {}: {}", self.key, e)))?;

        Ok(CacheEntry {
            key: self.key,
            response: ResponseSnapshot {
                status: self.status,
                status_text: self.status_text,
                headers: self.headers,
                body,
                stored_at: self.stored_at,
            },
        })
    }
}

/// Marker file written into each partition directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionMeta {
    pub name: CacheName,
    pub created_at: DateTime<Utc>,
}

/// Per-partition totals, for operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub name: CacheName,
    pub entries: usize,
    pub body_bytes: u64,
}
