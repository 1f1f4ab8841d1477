//! File-backed partitions that survive restarts.
//!
//! Layout: `<root>/<partition>/<sha256>.meta` holds the JSON metadata and
//! names the body file, `<sha256>-<body sha256>.body`. Both are written
//! under a temporary name and renamed into place, body first, so the
//! metadata only ever points at a complete body.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::CacheStorage;
use crate::cache::types::{CacheKey, CacheMetadata, CacheResult, CachedResponse};

const META_EXT: &str = "meta";
const BODY_EXT: &str = "body";
const TMP_EXT: &str = "tmp";

/// Metadata file contents.
#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    #[serde(flatten)]
    metadata: CacheMetadata,
    /// Body file name within the partition directory
    body_file: String,
}

/// Write to a sibling temp file, then rename over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".");
    tmp.push(TMP_EXT);
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await
}

fn body_file_name(key: &CacheKey, body: &[u8]) -> String {
    format!("{}-{:x}.{}", key.to_filename(), Sha256::digest(body), BODY_EXT)
}

/// A body file name read back from disk must stay inside its directory.
fn is_plain_file_name(name: &str) -> bool {
    Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Partition names become directory names; anything outside
    /// `[A-Za-z0-9._-]` is replaced.
    fn partition_dir(&self, partition: &str) -> PathBuf {
        let safe: String = partition
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        let safe = if safe.chars().all(|c| c == '.') { format!("_{}", safe) } else { safe };
        self.root.join(safe)
    }

    fn meta_path(&self, partition: &str, key: &CacheKey) -> PathBuf {
        self.partition_dir(partition)
            .join(format!("{}.{}", key.to_filename(), META_EXT))
    }

    async fn read_meta(&self, path: &Path) -> CacheResult<Option<StoredMeta>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStorage for FileStorage {
    async fn create(&self, partition: &str) -> CacheResult<()> {
        fs::create_dir_all(self.partition_dir(partition)).await?;
        Ok(())
    }

    async fn get(&self, partition: &str, key: &CacheKey) -> CacheResult<Option<CachedResponse>> {
        let meta_path = self.meta_path(partition, key);
        let Some(stored) = self.read_meta(&meta_path).await? else {
            return Ok(None);
        };

        if stored.metadata.key != *key || !is_plain_file_name(&stored.body_file) {
            warn!(path = ?meta_path, "Cache entry metadata does not match, ignoring");
            return Ok(None);
        }

        let body_path = self.partition_dir(partition).join(&stored.body_file);
        let body = match fs::read(&body_path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?body_path, "Cache body missing, treating as miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CachedResponse {
            metadata: stored.metadata,
            body,
        }))
    }

    async fn put(&self, partition: &str, entry: CachedResponse) -> CacheResult<()> {
        let key = entry.metadata.key.clone();
        let dir = self.partition_dir(partition);
        fs::create_dir_all(&dir).await?;

        let meta_path = self.meta_path(partition, &key);
        let previous = match self.read_meta(&meta_path).await {
            Ok(previous) => previous.map(|p| p.body_file),
            Err(e) => {
                warn!(path = ?meta_path, error = %e, "Replacing unreadable cache metadata");
                None
            }
        };

        let body_file = body_file_name(&key, &entry.body);
        write_atomic(&dir.join(&body_file), &entry.body).await?;

        let stored = StoredMeta {
            metadata: entry.metadata,
            body_file,
        };
        write_atomic(&meta_path, &serde_json::to_vec_pretty(&stored)?).await?;

        if let Some(old) = previous.filter(|old| *old != stored.body_file && is_plain_file_name(old)) {
            if let Err(e) = fs::remove_file(dir.join(&old)).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(file = %old, error = %e, "Failed to remove replaced cache body");
                }
            }
        }

        debug!(partition, url = %key.url, bytes = entry.body.len(), "Cache entry written");
        Ok(())
    }

    async fn keys(&self, partition: &str) -> CacheResult<Vec<CacheKey>> {
        let mut keys = Vec::new();
        let mut dir = match fs::read_dir(self.partition_dir(partition)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<StoredMeta>(&bytes) {
                    Ok(stored) => keys.push(stored.metadata.key),
                    Err(e) => warn!(path = ?path, error = %e, "Skipping unreadable cache metadata"),
                },
                Err(e) => warn!(path = ?path, error = %e, "Skipping unreadable cache metadata"),
            }
        }
        Ok(keys)
    }
}
