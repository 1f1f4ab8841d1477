//! The offline cache controller.
//!
//! Lifecycle: `Installing` → `Activating` → `Active`, or `Redundant` when
//! installation fails. Installation precaches a fixed manifest into a
//! versioned partition; once active, every non-navigation request is served
//! cache-first and qualifying misses are stored on the way back.

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachePartition, CacheStorage};
use crate::error::{FetchError, WorkerError};
use crate::net::{Destination, Fetch, Request, Response};

/// Status a network response needs before it is cached on a miss
const CACHEABLE_STATUS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Activating,
    Active,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Installing => "installing",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Pages under the scope are controlled; their requests to any origin are handled
    pub scope: Url,
    /// Partition name; bump it to start from an empty cache
    pub cache_name: String,
    /// Assets fetched and stored during installation
    pub precache: Vec<Url>,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// The worker's answer to an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not handled; the requester goes to the network itself
    PassThrough,
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

pub struct OfflineCacheController {
    options: WorkerOptions,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Fetch>,
    partition: Option<CachePartition>,
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl OfflineCacheController {
    pub fn new(options: WorkerOptions, storage: Arc<dyn CacheStorage>, network: Arc<dyn Fetch>) -> Self {
        Self {
            options,
            storage,
            network,
            partition: None,
            state: WorkerState::Installing,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    pub fn partition(&self) -> Option<&CachePartition> {
        self.partition.as_ref()
    }

    /// True once activation no longer waits for older workers.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    /// Open the partition and precache the manifest. All-or-nothing: if any
    /// asset cannot be fetched, nothing is stored and the worker is redundant.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Installing {
            return Err(WorkerError::InvalidState {
                action: "install",
                state: self.state.to_string(),
            });
        }

        self.skip_waiting = true;

        let partition = match CachePartition::open(self.storage.clone(), &self.options.cache_name).await {
            Ok(partition) => partition,
            Err(e) => {
                self.state = WorkerState::Redundant;
                return Err(e.into());
            }
        };

        match self.precache(&partition).await {
            Ok(count) => {
                info!(cache = %self.options.cache_name, assets = count, "Worker installed");
                self.partition = Some(partition);
                self.state = WorkerState::Activating;
                Ok(())
            }
            Err(e) => {
                warn!(cache = %self.options.cache_name, error = %e, "Worker installation failed");
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    async fn precache(&self, partition: &CachePartition) -> Result<usize, WorkerError> {
        let fetches = self.options.precache.iter().map(|url| {
            let network = self.network.clone();
            let request = Request::get(url.clone());
            async move {
                match network.fetch(request.clone()).await {
                    Ok(response) if response.is_ok() => Ok((request, response)),
                    Ok(response) => Err(WorkerError::Install {
                        url: request.url.to_string(),
                        reason: format!("HTTP status {}", response.status),
                    }),
                    Err(e) => Err(WorkerError::Install {
                        url: request.url.to_string(),
                        reason: e.to_string(),
                    }),
                }
            }
        });

        let fetched = try_join_all(fetches).await?;
        for (request, response) in &fetched {
            partition.put(request, response).await?;
        }
        Ok(fetched.len())
    }

    /// Take control of already-open pages.
    pub async fn activate(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Activating {
            return Err(WorkerError::InvalidState {
                action: "activate",
                state: self.state.to_string(),
            });
        }

        self.clients_claimed = true;
        self.state = WorkerState::Active;
        info!(cache = %self.options.cache_name, "Worker active, clients claimed");
        Ok(())
    }

    /// Bring back a worker that was activated in an earlier session. Its
    /// partition already holds whatever it cached back then.
    pub async fn resume(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Installing {
            return Err(WorkerError::InvalidState {
                action: "resume",
                state: self.state.to_string(),
            });
        }

        let partition = CachePartition::open(self.storage.clone(), &self.options.cache_name).await?;
        self.partition = Some(partition);
        self.state = WorkerState::Activating;
        self.activate().await
    }

    fn should_cache(request: &Request, response: &Response) -> bool {
        response.status == CACHEABLE_STATUS
            && (matches!(request.destination, Destination::Style | Destination::Script)
                || request.url.as_str().contains(".json"))
    }

    /// Decide what to do with an intercepted request.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, FetchError> {
        if self.state != WorkerState::Active || !self.clients_claimed {
            return Ok(FetchOutcome::PassThrough);
        }

        // Navigations stay with the browser so pages remain bfcache-eligible.
        if request.is_navigation() {
            return Ok(FetchOutcome::PassThrough);
        }

        let Some(partition) = self.partition.as_ref() else {
            return Ok(FetchOutcome::PassThrough);
        };

        match partition.match_request(&request).await {
            Ok(Some(response)) => {
                debug!(url = %request.url, "Served from cache");
                return Ok(FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Cache,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(url = %request.url, error = %e, "Cache lookup failed, going to network"),
        }

        let response = self.network.fetch(request.clone()).await?;

        if Self::should_cache(&request, &response) {
            match partition.put(&request, &response).await {
                Ok(true) => debug!(url = %request.url, "Cached network response"),
                Ok(false) => {}
                Err(e) => warn!(url = %request.url, error = %e, "Failed to cache response"),
            }
        }

        Ok(FetchOutcome::Respond {
            response,
            source: ResponseSource::Network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::net::{Link, Loopback};

    struct Fixture {
        origin: Arc<Loopback>,
        link: Arc<Link>,
        storage: Arc<dyn CacheStorage>,
    }

    fn fixture() -> Fixture {
        let origin = Arc::new(Loopback::parse("http://site.test/").unwrap());
        origin.serve("/style.css", "body{}");
        origin.serve("/script.js", "init()");
        origin.serve("/data.json", "[]");
        origin.serve("/index.html", "<html></html>");
        let link = Arc::new(Link::new(origin.clone()));
        Fixture {
            origin,
            link,
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    fn controller(f: &Fixture) -> OfflineCacheController {
        let options = WorkerOptions {
            scope: f.origin.url("/"),
            cache_name: "browser-extension-v1".to_string(),
            precache: ["style.css", "script.js", "data.json"]
                .iter()
                .map(|p| f.origin.url(p))
                .collect(),
        };
        OfflineCacheController::new(options, f.storage.clone(), f.link.clone())
    }

    async fn active(f: &Fixture) -> OfflineCacheController {
        let mut c = controller(f);
        c.install().await.unwrap();
        c.activate().await.unwrap();
        c
    }

    fn respond(outcome: FetchOutcome) -> (Response, ResponseSource) {
        match outcome {
            FetchOutcome::Respond { response, source } => (response, source),
            FetchOutcome::PassThrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let f = fixture();
        let mut c = controller(&f);
        assert_eq!(c.state(), WorkerState::Installing);
        assert!(c.activate().await.is_err());

        c.install().await.unwrap();
        assert_eq!(c.state(), WorkerState::Activating);
        assert!(c.skips_waiting());
        assert!(!c.clients_claimed());

        c.activate().await.unwrap();
        assert_eq!(c.state(), WorkerState::Active);
        assert!(c.clients_claimed());
        assert_eq!(c.partition().unwrap().keys().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_install_fails_when_an_asset_is_missing() {
        let f = fixture();
        f.origin.remove("/script.js");
        let mut c = controller(&f);

        let err = c.install().await.unwrap_err();
        assert!(matches!(err, WorkerError::Install { ref url, .. } if url.ends_with("/script.js")));
        assert_eq!(c.state(), WorkerState::Redundant);
        assert!(f.storage.keys("browser-extension-v1").await.unwrap().is_empty());
        assert!(c.install().await.is_err());
    }

    #[tokio::test]
    async fn test_manifest_asset_served_offline() {
        let f = fixture();
        let c = active(&f).await;
        f.link.set_online(false);

        let req = Request::get(f.origin.url("style.css")).with_destination(Destination::Style);
        let (response, source) = respond(c.handle_fetch(req).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.text(), "body{}");
    }

    #[tokio::test]
    async fn test_navigation_never_intercepted() {
        let f = fixture();
        let c = active(&f).await;
        let url = f.origin.url("index.html");

        // Even a stored copy of the document is ignored.
        let stored = Response::new(200, url.clone(), "stale");
        c.partition().unwrap().put(&Request::get(url.clone()), &stored).await.unwrap();

        let nav = Request::get(url).with_destination(Destination::Document);
        assert!(matches!(c.handle_fetch(nav).await.unwrap(), FetchOutcome::PassThrough));
    }

    #[tokio::test]
    async fn test_miss_fills_cache_for_qualifying_assets() {
        let f = fixture();
        f.origin.serve("/theme.css", "h1{}");
        f.origin.serve("/extra.json", "{}");
        let c = active(&f).await;

        let css = Request::get(f.origin.url("theme.css")).with_destination(Destination::Style);
        let (_, source) = respond(c.handle_fetch(css.clone()).await.unwrap());
        assert_eq!(source, ResponseSource::Network);

        let json = Request::get(f.origin.url("extra.json"));
        respond(c.handle_fetch(json.clone()).await.unwrap());

        f.link.set_online(false);
        let (response, source) = respond(c.handle_fetch(css).await.unwrap());
        assert_eq!((response.text().as_str(), source), ("h1{}", ResponseSource::Cache));
        let (_, source) = respond(c.handle_fetch(json).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_miss_does_not_cache_other_types_or_errors() {
        let f = fixture();
        f.origin.serve("/logo.svg", "<svg/>");
        f.origin.serve_status("/app.js", 500, "boom");
        let c = active(&f).await;

        let img = Request::get(f.origin.url("logo.svg")).with_destination(Destination::Image);
        respond(c.handle_fetch(img.clone()).await.unwrap());
        let script = Request::get(f.origin.url("app.js")).with_destination(Destination::Script);
        let (response, _) = respond(c.handle_fetch(script.clone()).await.unwrap());
        assert_eq!(response.status, 500);

        f.link.set_online(false);
        assert!(matches!(c.handle_fetch(img).await, Err(FetchError::Offline(_))));
        assert!(matches!(c.handle_fetch(script).await, Err(FetchError::Offline(_))));
    }

    #[tokio::test]
    async fn test_cross_origin_style_cached_on_miss() {
        let f = fixture();
        f.origin.serve("/fonts.css", "@font-face{}");
        let c = active(&f).await;
        let url = Url::parse("http://cdn.test/fonts.css").unwrap();

        let req = Request::get(url).with_destination(Destination::Style);
        let (_, source) = respond(c.handle_fetch(req.clone()).await.unwrap());
        assert_eq!(source, ResponseSource::Network);

        f.link.set_online(false);
        let (response, source) = respond(c.handle_fetch(req).await.unwrap());
        assert_eq!((response.text().as_str(), source), ("@font-face{}", ResponseSource::Cache));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let f = fixture();
        let c = active(&f).await;
        f.origin.serve("/data.json", "[\"changed\"]");

        let (response, source) = respond(c.handle_fetch(Request::get(f.origin.url("data.json"))).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.text(), "[]");
        assert_eq!(f.origin.hits("/data.json"), 1);
    }

    #[tokio::test]
    async fn test_inactive_worker_passes_through() {
        let f = fixture();
        let c = controller(&f);
        let req = Request::get(f.origin.url("style.css"));
        assert!(matches!(c.handle_fetch(req).await.unwrap(), FetchOutcome::PassThrough));
    }

    #[tokio::test]
    async fn test_resume_reuses_existing_partition() {
        let f = fixture();
        active(&f).await;
        f.link.set_online(false);

        let mut resumed = controller(&f);
        resumed.resume().await.unwrap();
        assert_eq!(resumed.state(), WorkerState::Active);

        let req = Request::get(f.origin.url("script.js")).with_destination(Destination::Script);
        let (response, source) = respond(resumed.handle_fetch(req).await.unwrap());
        assert_eq!((response.text().as_str(), source), ("init()", ResponseSource::Cache));
    }
}
