//! Response cache stores for Portico (in-memory and filesystem).

pub mod keys;
pub mod memory;
pub mod provider;
pub mod types;

pub use keys::{entry_file_name, partition_dir_name, sanitize_key};
pub use memory::MemoryStore;
pub use provider::{FilesystemStore, default_cache_dir};
pub use types::{PartitionSummary, StoredEntry};
