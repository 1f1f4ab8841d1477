//! Named cache partitions for offline responses.
//!
//! A partition maps a request identity (method + URL) to a stored response.
//! Entries never expire; a new partition name is the only way to start over.
//!
//! - `CacheStorage`: the provider trait, with `MemoryStorage` and
//!   `FileStorage` implementations
//! - `CachePartition`: handle on one named partition, used by the worker

pub mod partition;
pub mod providers;
pub mod types;

pub use partition::CachePartition;
pub use providers::{CacheStorage, FileStorage, MemoryStorage};
pub use types::{CacheKey, CacheMetadata, CacheResult, CachedResponse};
