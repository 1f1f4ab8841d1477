//! Durable key-value persistence for small preferences.
//!
//! `FileStore` keeps every key in one JSON object on disk and rewrites it on
//! each `set`, which is fine for the handful of keys the page stores.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Storage file name in the config directory
const STORAGE_FILE: &str = "storage.json";

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store in `dir`, reading any values saved earlier.
    pub fn open(dir: PathBuf) -> Result<Self> {
        let path = dir.join(STORAGE_FILE);
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse storage file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("theme").unwrap(), None);
        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        store.set("theme", "").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path().to_path_buf()).unwrap();
            store.set("theme", "dark").unwrap();
        }
        let store = FileStore::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "not json").unwrap();
        assert!(FileStore::open(dir.path().to_path_buf()).is_err());
    }
}
