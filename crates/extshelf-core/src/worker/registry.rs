use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration file name in cache directory
const REGISTRATION_FILE: &str = "registration.json";

/// The last worker that reached the active state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub scope: String,
    pub script_url: String,
    pub cache_name: String,
    pub activated_at: DateTime<Utc>,
}

/// Persists the active registration across runs, so an origin that is
/// unreachable at startup still gets its previously installed worker.
pub struct Registry {
    dir: Option<PathBuf>,
    pub record: Option<RegistrationRecord>,
}

impl Registry {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir: Some(dir),
            record: None,
        }
    }

    /// A registry that forgets everything on exit.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            record: None,
        }
    }

    /// Load registration from disk
    pub fn load(&mut self) -> Result<bool> {
        let Some(path) = self.registration_path() else {
            return Ok(self.record.is_some());
        };
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read registration file")?;
            let record: RegistrationRecord = serde_json::from_str(&contents)
                .context("Failed to parse registration file")?;
            self.record = Some(record);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save registration to disk
    pub fn save(&self) -> Result<()> {
        if let (Some(path), Some(record)) = (self.registration_path(), self.record.as_ref()) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(record)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Forget the registration
    pub fn clear(&mut self) -> Result<()> {
        self.record = None;
        if let Some(path) = self.registration_path() {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// The stored registration, if it was made for this script.
    pub fn record_for(&self, script_url: &str) -> Option<&RegistrationRecord> {
        self.record.as_ref().filter(|r| r.script_url == script_url)
    }

    fn registration_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(REGISTRATION_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RegistrationRecord {
        RegistrationRecord {
            scope: "http://site.test/".to_string(),
            script_url: "http://site.test/sw.js".to_string(),
            cache_name: "browser-extension-v1".to_string(),
            activated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path().to_path_buf());
        assert!(!registry.load().unwrap());

        registry.record = Some(record());
        registry.save().unwrap();

        let mut reloaded = Registry::new(dir.path().to_path_buf());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.record, registry.record);

        reloaded.clear().unwrap();
        assert!(!Registry::new(dir.path().to_path_buf()).load().unwrap());
    }

    #[test]
    fn test_record_for_matches_script() {
        let mut registry = Registry::in_memory();
        registry.record = Some(record());
        assert!(registry.record_for("http://site.test/sw.js").is_some());
        assert!(registry.record_for("http://site.test/other.js").is_none());
        assert!(registry.load().unwrap());
    }
}
