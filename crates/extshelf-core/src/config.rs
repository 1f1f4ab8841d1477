//! Application configuration management.
//!
//! The configuration names the origin the page is served from (a URL, or a
//! local site directory standing in for one), the data document, the worker
//! script and its cache partition, and the page's fetch timeout.
//!
//! Configuration is stored at `~/.config/extshelf/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "extshelf";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Origin used when none is configured
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/";

/// Environment overrides, applied after the file is read
const ENV_BASE_URL: &str = "EXTSHELF_BASE_URL";
const ENV_SITE_DIR: &str = "EXTSHELF_SITE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin the page and its assets are fetched from
    pub base_url: String,
    /// Serve this directory instead of talking HTTP to `base_url`
    pub site_dir: Option<PathBuf>,
    /// Data document, relative to `base_url`
    pub data_path: String,
    /// Worker script, relative to `base_url`
    pub worker_script: String,
    /// Cache partition name; change it to discard everything cached so far
    pub cache_name: String,
    /// Assets stored when the worker installs, relative to `base_url`
    pub precache: Vec<String>,
    /// Upper bound on the data fetch
    pub fetch_timeout_ms: u64,
    /// Skeleton cells shown while the data loads
    pub placeholder_count: usize,
    /// Register the offline cache worker at startup
    pub offline_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_dir: None,
            data_path: "data.json".to_string(),
            worker_script: "sw.js".to_string(),
            cache_name: "browser-extension-v1".to_string(),
            precache: vec![
                "style.css".to_string(),
                "script.js".to_string(),
                "data.json".to_string(),
            ],
            fetch_timeout_ms: 3000,
            placeholder_count: 9,
            offline_cache: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `EXTSHELF_BASE_URL` / `EXTSHELF_SITE_DIR` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url;
            }
        }
        if let Ok(site_dir) = std::env::var(ENV_SITE_DIR) {
            if !site_dir.trim().is_empty() {
                self.site_dir = Some(PathBuf::from(site_dir));
            }
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Origin with a trailing slash, so relative paths resolve beneath it.
    pub fn base_url(&self) -> Result<Url> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).with_context(|| format!("Invalid base URL: {}", self.base_url))
    }

    pub fn resolve(&self, path: &str) -> Result<Url> {
        let base = self.base_url()?;
        base.join(path.trim_start_matches("./"))
            .with_context(|| format!("Invalid path: {}", path))
    }

    pub fn data_url(&self) -> Result<Url> {
        self.resolve(&self.data_path)
    }

    pub fn worker_script_url(&self) -> Result<Url> {
        self.resolve(&self.worker_script)
    }

    pub fn precache_urls(&self) -> Result<Vec<Url>> {
        self.precache.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
