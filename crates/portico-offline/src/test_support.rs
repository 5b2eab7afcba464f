//! Fakes shared by the unit tests.

use async_trait::async_trait;
use portico_cache::MemoryStore;
use portico_core::cache::{CacheKey, CacheName, ResponseSnapshot};
use portico_core::ports::{CacheStore, Network};
use portico_core::request::FetchRequest;
use portico_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const ORIGIN: &str = "https://portal.example";

pub fn url(path: &str) -> url::Url {
    url::Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Network answering from a fixed route table; unknown URLs get a 404.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    unreachable: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, path: &str, response: ResponseSnapshot) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), response);
    }

    /// Fail fetches of a single path as if the host dropped the connection.
    pub fn unreachable(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(url(path).to_string());
    }

    pub fn reachable(&self, path: &str) {
        self.unreachable.lock().unwrap().remove(&url(path).to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot> {
        let target = request.url.to_string();
        self.calls.lock().unwrap().push(target.clone());

        if self.offline.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&target)
        {
            return Err(Error::Network(format!("connection refused: {}", target)));
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&target)
            .cloned()
            .unwrap_or_else(|| ResponseSnapshot::new(404, "not found")))
    }
}

/// Memory store that counts every read and write.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub fail_open: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touches(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn open(&self, name: &CacheName) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::CacheOpen {
                name: name.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.inner.open(name).await
    }

    async fn put(
        &self,
        name: &CacheName,
        key: &CacheKey,
        response: &ResponseSnapshot,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::CacheWrite {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.inner.put(name, key, response).await
    }

    async fn get(&self, name: &CacheName, key: &CacheKey) -> Result<Option<ResponseSnapshot>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(name, key).await
    }

    async fn partitions(&self) -> Result<Vec<CacheName>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.partitions().await
    }

    async fn keys(&self, name: &CacheName) -> Result<Vec<CacheKey>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.keys(name).await
    }

    async fn delete(&self, name: &CacheName) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(name).await
    }
}

/// Poll until `name` holds `key`; background cache writes land shortly
/// after the response is returned.
pub async fn wait_for_entry(
    store: &dyn CacheStore,
    name: &CacheName,
    key: &CacheKey,
) -> Option<ResponseSnapshot> {
    for _ in 0..100 {
        if let Ok(Some(hit)) = store.get(name, key).await {
            return Some(hit);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
