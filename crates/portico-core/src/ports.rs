//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the offline layer and its
//! storage and transport adapters.

use crate::cache::{CacheKey, CacheName, ResponseSnapshot};
use crate::request::FetchRequest;
use crate::Result;
use async_trait::async_trait;

/// Named partitions of stored responses.
///
/// Mutations are additive (`put`) or wholesale (`delete`). Implementations
/// serialize conflicting access to the same key; concurrent writes of the
/// same key are last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a partition, creating it if missing.
    async fn open(&self, name: &CacheName) -> Result<()>;

    /// Store a response, replacing any previous entry for the key.
    async fn put(&self, name: &CacheName, key: &CacheKey, response: &ResponseSnapshot)
    -> Result<()>;

    /// Look up a key in one partition.
    async fn get(&self, name: &CacheName, key: &CacheKey) -> Result<Option<ResponseSnapshot>>;

    /// Names of all existing partitions, sorted.
    async fn partitions(&self) -> Result<Vec<CacheName>>;

    /// Keys stored in a partition, sorted.
    async fn keys(&self, name: &CacheName) -> Result<Vec<CacheKey>>;

    /// Delete a partition and every entry in it. Returns whether it existed.
    async fn delete(&self, name: &CacheName) -> Result<bool>;

    /// Remove storage that no longer maps to a listable partition, keeping
    /// (and repairing) anything belonging to `keep`. Returns how many were
    /// removed.
    async fn prune_orphans(&self, _keep: &[&CacheName]) -> Result<usize> {
        Ok(0)
    }

    /// Look up a key across `names` in order, returning the first hit.
    async fn match_in(
        &self,
        names: &[&CacheName],
        key: &CacheKey,
    ) -> Result<Option<ResponseSnapshot>> {
        for name in names {
            if let Some(response) = self.get(name, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// The real network.
///
/// Returns `Ok` for any HTTP response, whatever its status. `Err` means no
/// response arrived at all (connection refused, DNS, timeout).
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot>;
}
