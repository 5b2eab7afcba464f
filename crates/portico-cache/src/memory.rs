//! In-memory cache store.

use async_trait::async_trait;
use portico_core::Result;
use portico_core::cache::{CacheKey, CacheName, ResponseSnapshot};
use portico_core::ports::CacheStore;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Cache store backed by process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<CacheName, HashMap<CacheKey, ResponseSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a partition, `None` if it does not exist.
    pub async fn len(&self, name: &CacheName) -> Option<usize> {
        self.partitions.read().await.get(name).map(|p| p.len())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, name: &CacheName) -> Result<()> {
        self.partitions
            .write()
            .await
            .entry(name.clone())
            .or_default();
        Ok(())
    }

    async fn put(
        &self,
        name: &CacheName,
        key: &CacheKey,
        response: &ResponseSnapshot,
    ) -> Result<()> {
        self.partitions
            .write()
            .await
            .entry(name.clone())
            .or_default()
            .insert(key.clone(), response.clone());
        Ok(())
    }

    async fn get(&self, name: &CacheName, key: &CacheKey) -> Result<Option<ResponseSnapshot>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(name).and_then(|p| p.get(key)).cloned())
    }

    async fn partitions(&self) -> Result<Vec<CacheName>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn keys(&self, name: &CacheName) -> Result<Vec<CacheKey>> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<CacheKey> = partitions
            .get(name)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, name: &CacheName) -> Result<bool> {
        Ok(self.partitions.write().await.remove(name).is_some())
    }
}
