//! Filesystem-backed cache store.
//!
//! Layout: one directory per partition holding a `partition.json` marker and
//! one JSON file per entry.
//!
//! ```text
//! <root>/portal-v1-1a2b3c4d/partition.json
//! <root>/portal-v1-1a2b3c4d/5f0e...c1.json
//! ```

use crate::keys::{entry_file_name, partition_dir_name};
use crate::types::{PartitionMeta, PartitionSummary, StoredEntry};
use async_trait::async_trait;
use portico_core::cache::{CacheKey, CacheName, ResponseSnapshot};
use portico_core::ports::CacheStore;
use portico_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PARTITION_MARKER: &str = "partition.json";

/// Cache store that survives restarts.
pub struct FilesystemStore {
    root_dir: PathBuf,
}

impl FilesystemStore {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn partition_path(&self, name: &CacheName) -> PathBuf {
        self.root_dir.join(partition_dir_name(name))
    }

    fn entry_path(&self, name: &CacheName, key: &CacheKey) -> PathBuf {
        self.partition_path(name).join(entry_file_name(key))
    }

    /// Missing paths and paths that cannot be checked both count as absent.
    async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// `Ok(None)` when the directory has no marker yet.
    async fn read_marker(dir: &Path) -> Result<Option<PartitionMeta>> {
        let marker = dir.join(PARTITION_MARKER);
        if !Self::exists(&marker).await {
            return Ok(None);
        }
        let raw = tokio::fs::read(&marker)
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read {}: {}", marker.display(), e)))?;
        let meta = serde_json::from_slice(&raw)
            .map_err(|e| Error::CacheRead(format!("Corrupt marker {}: {}", marker.display(), e)))?;
        Ok(Some(meta))
    }

    async fn write_marker(dir: &Path, name: &CacheName) -> Result<()> {
        let meta = PartitionMeta {
            name: name.clone(),
            created_at: chrono::Utc::now(),
        };
        let contents = serde_json::to_vec_pretty(&meta)?;
        Self::write_atomic(&dir.join(PARTITION_MARKER), &contents)
            .await
            .map_err(|e| Error::CacheOpen {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Partition directories under the root.
    async fn partition_dirs(&self) -> Result<Vec<PathBuf>> {
        if !Self::exists(&self.root_dir).await {
            return Ok(vec![]);
        }

        let mut dirs = vec![];
        let mut read_dir = tokio::fs::read_dir(&self.root_dir)
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read cache root: {}", e)))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read entry: {}", e)))?
        {
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }

    async fn read_entry(path: &Path) -> Result<StoredEntry> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&raw)
            .map_err(|e| Error::CacheRead(format!("Corrupt entry {}: {}", path.display(), e)))
    }

    /// Write via a temp file and rename so readers never see a partial entry.
    async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, contents).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn entry_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = vec![];
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read cache dir: {}", e)))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::CacheRead(format!("Failed to read entry: {}", e)))?
        {
            let path = entry.path();
            let is_entry = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|n| n != PARTITION_MARKER);
            if is_entry {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Entry counts and body sizes per partition.
    pub async fn summarize(&self) -> Result<Vec<PartitionSummary>> {
        let mut summaries = vec![];
        for name in self.partitions().await? {
            let mut entries = 0;
            let mut body_bytes = 0u64;
            for path in Self::entry_files(&self.partition_path(&name)).await? {
                match Self::read_entry(&path).await.and_then(|e| e.decode()) {
                    Ok(entry) => {
                        entries += 1;
                        body_bytes += entry.response.body.len() as u64;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
                }
            }
            summaries.push(PartitionSummary {
                name,
                entries,
                body_bytes,
            });
        }
        Ok(summaries)
    }
}

#[async_trait]
impl CacheStore for FilesystemStore {
    async fn open(&self, name: &CacheName) -> Result<()> {
        let dir = self.partition_path(name);
        match Self::read_marker(&dir).await {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(e) => warn!(partition = %name, error = %e, "Rewriting unreadable partition marker"),
        }

        tokio::fs::create_dir_all(&dir).await.map_err(|e| Error::CacheOpen {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Self::write_marker(&dir, name).await?;

        debug!(partition = %name, path = %dir.display(), "Created cache partition");
        Ok(())
    }

    async fn put(
        &self,
        name: &CacheName,
        key: &CacheKey,
        response: &ResponseSnapshot,
    ) -> Result<()> {
        self.open(name).await?;

        let stored = StoredEntry::encode(key, response);
        let contents = serde_json::to_vec(&stored)?;
        Self::write_atomic(&self.entry_path(name, key), &contents)
            .await
            .map_err(|e| Error::CacheWrite {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get(&self, name: &CacheName, key: &CacheKey) -> Result<Option<ResponseSnapshot>> {
        let path = self.entry_path(name, key);
        if !Self::exists(&path).await {
            return Ok(None);
        }

        let entry = Self::read_entry(&path).await?.decode()?;
        // Digest collision: not our entry.
        if &entry.key != key {
            return Ok(None);
        }
        Ok(Some(entry.response))
    }

    async fn partitions(&self) -> Result<Vec<CacheName>> {
        let mut names = vec![];
        for dir in self.partition_dirs().await? {
            match Self::read_marker(&dir).await {
                Ok(Some(meta)) => names.push(meta.name),
                Ok(None) => {}
                Err(e) => warn!(path = %dir.display(), error = %e, "Skipping unreadable partition"),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn keys(&self, name: &CacheName) -> Result<Vec<CacheKey>> {
        let dir = self.partition_path(name);
        if !Self::exists(&dir).await {
            return Ok(vec![]);
        }

        let mut keys = vec![];
        for path in Self::entry_files(&dir).await? {
            match Self::read_entry(&path).await {
                Ok(entry) => keys.push(entry.key),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, name: &CacheName) -> Result<bool> {
        let dir = self.partition_path(name);
        if !Self::exists(&dir).await {
            return Ok(false);
        }

        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| Error::Internal(format!("Failed to delete partition {}: {}", name, e)))?;
        Ok(true)
    }

    /// Directories whose marker exists but cannot be read. Kept partitions
    /// get a fresh marker; anything else is removed.
    async fn prune_orphans(&self, keep: &[&CacheName]) -> Result<usize> {
        let mut removed = 0;
        for dir in self.partition_dirs().await? {
            if Self::read_marker(&dir).await.is_ok() {
                continue;
            }

            if let Some(name) = keep.iter().find(|name| self.partition_path(name) == dir) {
                warn!(partition = %name, "Repairing unreadable partition marker");
                Self::write_marker(&dir, name).await?;
                continue;
            }

            warn!(path = %dir.display(), "Removing unreadable cache partition");
            tokio::fs::remove_dir_all(&dir).await.map_err(|e| {
                Error::Internal(format!("Failed to remove {}: {}", dir.display(), e))
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Platform cache directory for the gateway, e.g. `~/.cache/portico`.
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("gov", "portico", "portico")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/var/cache/portico"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse("https://portal.example").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_put_get_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let name = CacheName::from("portal-runtime");
        let response = ResponseSnapshot::new(200, vec![0u8, 159, 146, 150])
            .with_header("content-type", "image/png");

        {
            let store = FilesystemStore::new(dir.path().to_path_buf());
            store.put(&name, &key("/icon.png"), &response).await.unwrap();
        }

        let store = FilesystemStore::new(dir.path().to_path_buf());
        let hit = store.get(&name, &key("/icon.png")).await.unwrap().unwrap();
        assert_eq!(hit, response);
        assert!(store.get(&name, &key("/other.png")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        let name = CacheName::from("portal-v1");

        for body in ["one", "two", "three"] {
            store
                .put(&name, &key("/manifest.json"), &ResponseSnapshot::new(200, body))
                .await
                .unwrap();
        }

        assert_eq!(store.keys(&name).await.unwrap(), vec![key("/manifest.json")]);
        let hit = store.get(&name, &key("/manifest.json")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"three".to_vec());
    }

    #[tokio::test]
    async fn test_partitions_delete_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().join("cache"));

        assert!(store.partitions().await.unwrap().is_empty());

        store.open(&"portal-v1".into()).await.unwrap();
        store
            .put(&"portal-runtime".into(), &key("/news"), &ResponseSnapshot::new(200, "news"))
            .await
            .unwrap();

        assert_eq!(
            store.partitions().await.unwrap(),
            vec![CacheName::from("portal-runtime"), CacheName::from("portal-v1")]
        );

        let summary = store.summarize().await.unwrap();
        let runtime = summary
            .iter()
            .find(|s| s.name.as_str() == "portal-runtime")
            .unwrap();
        assert_eq!(runtime.entries, 1);
        assert_eq!(runtime.body_bytes, 4);

        assert!(store.delete(&"portal-v1".into()).await.unwrap());
        assert!(!store.delete(&"portal-v1".into()).await.unwrap());
        assert_eq!(
            store.partitions().await.unwrap(),
            vec![CacheName::from("portal-runtime")]
        );
    }

    async fn corrupt_marker(store: &FilesystemStore, name: &CacheName) {
        let marker = store.partition_path(name).join(PARTITION_MARKER);
        tokio::fs::write(&marker, b"{trunc").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_marker_does_not_hide_other_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        let old = CacheName::from("portal-v0");
        let current = CacheName::from("portal-v1");
        store.open(&old).await.unwrap();
        store
            .put(&current, &key("/"), &ResponseSnapshot::new(200, "home"))
            .await
            .unwrap();
        corrupt_marker(&store, &old).await;

        assert_eq!(store.partitions().await.unwrap(), vec![current.clone()]);
        assert_eq!(store.summarize().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prune_removes_unreadable_and_repairs_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        let old = CacheName::from("portal-v0");
        let current = CacheName::from("portal-v1");
        for name in [&old, &current] {
            store
                .put(name, &key("/"), &ResponseSnapshot::new(200, "home"))
                .await
                .unwrap();
            corrupt_marker(&store, name).await;
        }

        assert_eq!(store.prune_orphans(&[&current]).await.unwrap(), 1);
        assert!(!store.partition_path(&old).exists());
        assert_eq!(store.partitions().await.unwrap(), vec![current.clone()]);
        assert!(store.get(&current, &key("/")).await.unwrap().is_some());

        assert_eq!(store.prune_orphans(&[&current]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_rewrites_corrupt_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        let name = CacheName::from("portal-runtime");
        store.open(&name).await.unwrap();
        corrupt_marker(&store, &name).await;

        store.open(&name).await.unwrap();
        assert_eq!(store.partitions().await.unwrap(), vec![name]);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_skipped_in_listings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        let name = CacheName::from("portal-runtime");
        store
            .put(&name, &key("/news"), &ResponseSnapshot::new(200, "news"))
            .await
            .unwrap();
        store
            .put(&name, &key("/about"), &ResponseSnapshot::new(200, "about"))
            .await
            .unwrap();
        tokio::fs::write(store.entry_path(&name, &key("/about")), b"not json")
            .await
            .unwrap();

        assert_eq!(store.keys(&name).await.unwrap(), vec![key("/news")]);
        let summary = store.summarize().await.unwrap();
        assert_eq!(summary[0].entries, 1);
    }

    #[tokio::test]
    async fn test_missing_paths_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().join("never-created"));
        let name = CacheName::from("portal-v1");

        assert!(store.partitions().await.unwrap().is_empty());
        assert!(store.keys(&name).await.unwrap().is_empty());
        assert!(store.get(&name, &key("/")).await.unwrap().is_none());
        assert!(!store.delete(&name).await.unwrap());
        assert_eq!(store.prune_orphans(&[&name]).await.unwrap(), 0);
    }
}
