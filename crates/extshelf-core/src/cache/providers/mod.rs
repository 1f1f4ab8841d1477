//! # Cache Providers
//!
//! Storage backends for cache partitions.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use super::types::{CacheKey, CacheResult, CachedResponse};

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Backend holding any number of named partitions.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the partition if it does not exist yet
    async fn create(&self, partition: &str) -> CacheResult<()>;

    async fn get(&self, partition: &str, key: &CacheKey) -> CacheResult<Option<CachedResponse>>;

    /// Store an entry, replacing any previous entry for the same key
    async fn put(&self, partition: &str, entry: CachedResponse) -> CacheResult<()>;

    async fn keys(&self, partition: &str) -> CacheResult<Vec<CacheKey>>;
}
