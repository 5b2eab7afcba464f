//! File naming for cache partitions and entries.

use portico_core::cache::{CacheKey, CacheName};
use sha2::{Digest, Sha256};

/// File name holding the entry for `key`.
///
/// URLs are unbounded and full of path separators, so entries are named by
/// digest rather than by key.
pub fn entry_file_name(key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method.as_bytes());
    hasher.update(b" ");
    hasher.update(key.url.as_bytes());
    if let Some(scope) = &key.scope {
        hasher.update(b" ");
        hasher.update(scope.as_bytes());
    }
    let hash = hasher.finalize();
    format!("{}.json", hex::encode(&hash[..16]))
}

/// Directory name for a partition: readable prefix plus a short digest so
/// that `a/b` and `a_b` do not collide.
pub fn partition_dir_name(name: &CacheName) -> String {
    let hash = Sha256::digest(name.as_str().as_bytes());
    format!("{}-{}", sanitize_key(name.as_str()), hex::encode(&hash[..4]))
}

/// Sanitize a key for use in filenames.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}
