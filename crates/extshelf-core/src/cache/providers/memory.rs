use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CacheStorage;
use crate::cache::types::{CacheKey, CacheResult, CachedResponse};

type Partition = HashMap<CacheKey, CachedResponse>;

/// Partitions held in process memory; gone when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn create(&self, partition: &str) -> CacheResult<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn get(&self, partition: &str, key: &CacheKey) -> CacheResult<Option<CachedResponse>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .and_then(|p| p.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, entry: CachedResponse) -> CacheResult<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default()
            .insert(entry.metadata.key.clone(), entry);
        Ok(())
    }

    async fn keys(&self, partition: &str) -> CacheResult<Vec<CacheKey>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }
}
