//! Wiring for a running page.
//!
//! The transport (HTTP or a site directory) sits behind an online/offline
//! switch and the HTTP cache. The worker is registered over that stack and
//! the page fetches through it.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{CacheStorage, FileStorage};
use crate::config::Config;
use crate::kv::{FileStore, KeyValueStore, MemoryStore};
use crate::net::{DirFetcher, Fetch, HttpCache, HttpFetcher, Link};
use crate::page::{Page, PageOptions};
use crate::worker::{
    register, ControlledFetch, RegistrationOptions, Registry, UpdateViaCache, WorkerHandle,
    WorkerOptions,
};

/// Cache storage directory, under the cache dir
const CACHES_DIR: &str = "caches";

/// Everything the runtime needs from its surroundings.
pub struct Host {
    /// Raw transport to the origin
    pub transport: Arc<dyn Fetch>,
    pub storage: Arc<dyn CacheStorage>,
    pub registry: Registry,
    pub prefs: Box<dyn KeyValueStore>,
}

impl Host {
    /// Host backed by the real filesystem and network.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn Fetch> = match &config.site_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Serving site from directory");
                Arc::new(DirFetcher::new(dir.clone()))
            }
            None => Arc::new(HttpFetcher::new().context("Failed to build HTTP client")?),
        };

        let cache_dir = config.cache_dir()?;
        let mut registry = Registry::new(cache_dir.clone());
        if let Err(e) = registry.load() {
            warn!(error = %e, "Ignoring unreadable worker registration");
        }

        let prefs: Box<dyn KeyValueStore> = match FileStore::open(Config::config_dir()?) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!(error = %e, "Preference storage unreadable, theme will not persist");
                Box::new(MemoryStore::new())
            }
        };

        Ok(Self {
            transport,
            storage: Arc::new(FileStorage::new(cache_dir.join(CACHES_DIR))),
            registry,
            prefs,
        })
    }
}

pub struct Runtime {
    page: Page,
    worker: Option<WorkerHandle>,
    link: Arc<Link>,
    registry: Registry,
}

impl Runtime {
    pub async fn start(config: &Config, online: bool) -> Result<Self> {
        let host = Host::from_config(config)?;
        Self::start_with(config, host, online).await
    }

    /// Build the network stack, register the worker when enabled, and
    /// create the page. A worker that fails to register leaves the page
    /// uncontrolled.
    pub async fn start_with(config: &Config, host: Host, online: bool) -> Result<Self> {
        let Host {
            transport,
            storage,
            mut registry,
            prefs,
        } = host;

        let link = Arc::new(Link::new(transport));
        link.set_online(online);
        let http_cache = Arc::new(HttpCache::new(link.clone()));

        let worker = if config.offline_cache {
            let registration = RegistrationOptions {
                script_url: config.worker_script_url()?,
                update_via_cache: UpdateViaCache::None,
            };
            let options = WorkerOptions {
                scope: config.base_url()?,
                cache_name: config.cache_name.clone(),
                precache: config.precache_urls()?,
            };
            match register(&registration, options, storage, http_cache.clone(), &mut registry).await {
                Ok(handle) => {
                    info!(state = %handle.state(), cache = handle.cache_name(), "Worker registered");
                    Some(handle)
                }
                Err(e) => {
                    warn!(error = %e, "Worker registration failed, page is uncontrolled");
                    None
                }
            }
        } else {
            None
        };

        let fetcher = ControlledFetch::new(http_cache).with_worker(worker.clone());
        let page = Page::new(PageOptions::from_config(config)?, Arc::new(fetcher), prefs);

        Ok(Self {
            page,
            worker,
            link,
            registry,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn worker(&self) -> Option<&WorkerHandle> {
        self.worker.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_online(&self) -> bool {
        self.link.is_online()
    }

    /// Flip the network switch, returning whether it is now online.
    pub fn toggle_online(&self) -> bool {
        let online = self.link.toggle();
        info!(online, "Network switched");
        online
    }

    pub async fn shutdown(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown().await;
        }
    }
}
