//! End-to-end behaviour of the page under the offline cache worker.

use std::sync::Arc;
use std::time::Duration;

use extshelf_core::cache::{CachePartition, CacheStorage, MemoryStorage};
use extshelf_core::kv::MemoryStore;
use extshelf_core::models::Filter;
use extshelf_core::net::{Destination, Fetch, HttpCache, Link, Loopback, Request, Response};
use extshelf_core::page::{Page, PageOptions, EMPTY_MESSAGE};
use extshelf_core::worker::{
    register, ControlledFetch, FetchOutcome, RegistrationOptions, Registry, ResponseSource,
    UpdateViaCache, WorkerHandle, WorkerOptions, WorkerState,
};
use extshelf_core::FetchError;

const CACHE_NAME: &str = "browser-extension-v1";

const DATA: &str = r#"[
    {"logo":"./assets/images/logo-devlens.svg","name":"DevLens","description":"Quickly inspect page layouts.","isActive":true},
    {"logo":"./assets/images/logo-style-spy.svg","name":"StyleSpy","description":"Analyze and copy CSS.","isActive":true},
    {"logo":"./assets/images/logo-speed-boost.svg","name":"SpeedBoost","description":"Accelerate page loading.","isActive":false}
]"#;

struct Site {
    origin: Arc<Loopback>,
    link: Arc<Link>,
    network: Arc<HttpCache>,
    storage: Arc<dyn CacheStorage>,
    registry: Registry,
}

impl Site {
    fn new() -> Self {
        let origin = Arc::new(Loopback::parse("http://site.test/").unwrap());
        origin.serve("/index.html", "<html><body></body></html>");
        origin.serve("/sw.js", "// worker");
        origin.serve("/style.css", "body { margin: 0; }");
        origin.serve("/script.js", "loadExtensions();");
        origin.serve("/data.json", DATA);
        origin.serve("/fonts.css", "@font-face {}");

        let link = Arc::new(Link::new(origin.clone()));
        let network = Arc::new(HttpCache::new(link.clone()));
        Self {
            origin,
            link,
            network,
            storage: Arc::new(MemoryStorage::new()),
            registry: Registry::in_memory(),
        }
    }

    fn worker_options(&self) -> WorkerOptions {
        WorkerOptions {
            scope: self.origin.url("/"),
            cache_name: CACHE_NAME.to_string(),
            precache: vec![
                self.origin.url("style.css"),
                self.origin.url("script.js"),
                self.origin.url("data.json"),
            ],
        }
    }

    async fn register(&mut self) -> Result<WorkerHandle, extshelf_core::WorkerError> {
        let registration = RegistrationOptions {
            script_url: self.origin.url("sw.js"),
            update_via_cache: UpdateViaCache::None,
        };
        let options = self.worker_options();
        register(
            &registration,
            options,
            self.storage.clone(),
            self.network.clone(),
            &mut self.registry,
        )
        .await
    }

    fn page(&self, worker: Option<WorkerHandle>) -> Page {
        let fetcher = ControlledFetch::new(self.network.clone()).with_worker(worker);
        let options = PageOptions {
            data_url: self.origin.url("data.json"),
            fetch_timeout: Duration::from_millis(3000),
            placeholder_count: 9,
        };
        Page::new(options, Arc::new(fetcher), Box::new(MemoryStore::new()))
    }
}

fn cells(page: &Page) -> usize {
    page.document().grid.matches(r#"<div class="extension" "#).count()
}

#[tokio::test]
async fn test_precached_asset_served_offline() {
    let mut site = Site::new();
    let worker = site.register().await.unwrap();
    assert_eq!(worker.state(), WorkerState::Active);

    site.link.set_online(false);
    let request = Request::get(site.origin.url("style.css")).with_destination(Destination::Style);
    match worker.intercept(request).await.unwrap() {
        FetchOutcome::Respond { response, source } => {
            assert_eq!(source, ResponseSource::Cache);
            assert_eq!(response.status, 200);
            assert_eq!(response.text(), "body { margin: 0; }");
        }
        FetchOutcome::PassThrough => panic!("precached asset was not served"),
    }
}

#[tokio::test]
async fn test_page_loads_offline_after_install() {
    let mut site = Site::new();
    let worker = site.register().await.unwrap();
    site.link.set_online(false);

    let mut page = site.page(Some(worker));
    page.load_extensions().await;

    assert_eq!(cells(&page), 3);
    assert!(page.document().grid.contains("SpeedBoost"));
}

#[tokio::test]
async fn test_navigation_never_served_from_cache() {
    let mut site = Site::new();
    let worker = site.register().await.unwrap();

    let navigation = Request::get(site.origin.url("index.html")).with_destination(Destination::Document);
    let stale = Response::new(200, site.origin.url("index.html"), "<html>stale</html>");
    let partition = CachePartition::open(site.storage.clone(), CACHE_NAME).await.unwrap();
    assert!(partition.put(&navigation, &stale).await.unwrap());

    assert!(matches!(
        worker.intercept(navigation.clone()).await.unwrap(),
        FetchOutcome::PassThrough
    ));

    let controlled = ControlledFetch::new(site.network.clone()).with_worker(Some(worker));
    let online = controlled.fetch(navigation.clone()).await.unwrap();
    assert_eq!(online.text(), "<html><body></body></html>");

    site.link.set_online(false);
    let offline = controlled.fetch(navigation).await;
    assert!(matches!(offline, Err(FetchError::Offline(_))));
}

#[tokio::test]
async fn test_runtime_cached_asset_available_offline() {
    let mut site = Site::new();
    let worker = site.register().await.unwrap();
    let before = worker.cached_entries().await;

    let request = Request::get(site.origin.url("fonts.css")).with_destination(Destination::Style);
    match worker.intercept(request.clone()).await.unwrap() {
        FetchOutcome::Respond { source, .. } => assert_eq!(source, ResponseSource::Network),
        FetchOutcome::PassThrough => panic!("style request was not intercepted"),
    }
    assert_eq!(worker.cached_entries().await, before + 1);

    site.link.set_online(false);
    site.origin.remove("/fonts.css");
    match worker.intercept(request).await.unwrap() {
        FetchOutcome::Respond { response, source } => {
            assert_eq!(source, ResponseSource::Cache);
            assert_eq!(response.text(), "@font-face {}");
        }
        FetchOutcome::PassThrough => panic!("cached asset was not served"),
    }
}

#[tokio::test]
async fn test_failed_responses_are_not_cached() {
    let mut site = Site::new();
    site.origin.serve_status("/missing.json", 404, "Not Found");
    let worker = site.register().await.unwrap();
    let before = worker.cached_entries().await;

    let request = Request::get(site.origin.url("missing.json"));
    match worker.intercept(request).await.unwrap() {
        FetchOutcome::Respond { response, .. } => assert_eq!(response.status, 404),
        FetchOutcome::PassThrough => panic!("json request was not intercepted"),
    }
    assert_eq!(worker.cached_entries().await, before);
}

#[tokio::test]
async fn test_failed_update_keeps_previous_worker() {
    let mut site = Site::new();
    let first = site.register().await.unwrap();
    first.shutdown().await;

    site.link.set_online(false);
    let resumed = site.register().await.unwrap();
    assert_eq!(resumed.state(), WorkerState::Active);

    let mut page = site.page(Some(resumed));
    page.load_extensions().await;
    assert_eq!(cells(&page), 3);
}

#[tokio::test]
async fn test_first_registration_offline_fails() {
    let mut site = Site::new();
    site.link.set_online(false);
    assert!(site.register().await.is_err());
    assert!(site.registry.record.is_none());

    let mut page = site.page(None);
    page.load_extensions().await;
    assert!(page.document().grid.contains(EMPTY_MESSAGE));
}

#[tokio::test]
async fn test_install_failure_leaves_page_uncontrolled() {
    let mut site = Site::new();
    site.origin.remove("/script.js");
    assert!(site.register().await.is_err());
    assert!(site.registry.record.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_data_fetch_renders_empty() {
    let site = Site::new();
    site.origin.hang("/data.json");

    let mut page = site.page(None);
    page.load_extensions().await;
    assert!(page.document().grid.contains(EMPTY_MESSAGE));
}

#[tokio::test]
async fn test_server_error_renders_empty() {
    let site = Site::new();
    site.origin.serve_status("/data.json", 500, "Internal Server Error");

    let mut page = site.page(None);
    page.load_extensions().await;
    assert!(page.document().grid.contains(EMPTY_MESSAGE));
}

#[tokio::test]
async fn test_filter_and_remove_through_controlled_page() {
    let mut site = Site::new();
    let worker = site.register().await.unwrap();
    let mut page = site.page(Some(worker));
    page.mount().await;

    page.filter_extensions(Filter::Active);
    assert_eq!(cells(&page), 2);

    let id = page.state().visible()[1].id;
    page.remove_ext(id).unwrap();
    assert_eq!(cells(&page), 1);
    assert_eq!(page.document().active_filter, Filter::Active);
    assert!(page.document().grid.contains("DevLens"));
    assert!(!page.document().grid.contains("SpeedBoost"));
}
