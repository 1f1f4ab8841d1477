//! The page controller.
//!
//! Bootstraps the grid, fetches the data document, and applies the user's
//! filter, remove, toggle and theme actions. State lives in an explicit
//! [`PageState`]; every mutation re-renders the grid from it so the markup
//! never drifts from the list.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::kv::KeyValueStore;
use crate::models::{Extension, ExtensionId, Filter, Theme, THEME_KEY};
use crate::net::{CacheMode, Fetch, Request};

use super::document::Document;
use super::render::{empty_html, fetch_error_html, placeholders_html, render_html};
use super::state::PageState;

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub data_url: Url,
    pub fetch_timeout: Duration,
    pub placeholder_count: usize,
}

impl PageOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            data_url: config.data_url()?,
            fetch_timeout: config.fetch_timeout(),
            placeholder_count: config.placeholder_count,
        })
    }
}

/// Fetch the data document once, preferring any stored copy.
///
/// Never fails: a timeout, transport error, error status or malformed
/// document all come back as an empty list. On timeout the in-flight
/// request is dropped.
pub async fn fetch_extensions(fetcher: &dyn Fetch, url: &Url, timeout: Duration) -> Vec<Extension> {
    let request = Request::get(url.clone()).with_cache_mode(CacheMode::ForceCache);

    let result = match tokio::time::timeout(timeout, fetcher.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    };

    let parsed = result.and_then(|response| {
        if response.is_ok() {
            response.json::<Vec<Extension>>()
        } else {
            Err(FetchError::from_status(response.status, &response.text()))
        }
    });

    match parsed {
        Ok(list) => {
            debug!(url = %url, count = list.len(), "Extensions fetched");
            list
        }
        Err(e) => {
            error!(url = %url, error = %e, "Failed to fetch extensions");
            Vec::new()
        }
    }
}

pub struct Page {
    options: PageOptions,
    fetcher: Arc<dyn Fetch>,
    prefs: Box<dyn KeyValueStore>,
    state: PageState,
    document: Document,
    loading: bool,
}

impl Page {
    pub fn new(options: PageOptions, fetcher: Arc<dyn Fetch>, prefs: Box<dyn KeyValueStore>) -> Self {
        Self {
            options,
            fetcher,
            prefs,
            state: PageState::new(),
            document: Document::default(),
            loading: false,
        }
    }

    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The fetch path the page uses, for callers running the data fetch
    /// on their own task.
    pub fn fetcher(&self) -> Arc<dyn Fetch> {
        self.fetcher.clone()
    }

    /// First paint: theme from storage, then the data load.
    pub async fn mount(&mut self) {
        self.load_theme();
        self.load_extensions().await;
    }

    pub async fn load_extensions(&mut self) {
        self.begin_load();
        let list = self.fetch_data().await;
        self.finish_load(list);
    }

    /// Fill the grid with skeleton cells so the layout holds while loading.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.document.grid = placeholders_html(self.options.placeholder_count);
    }

    pub fn finish_load(&mut self, list: Vec<Extension>) {
        self.loading = false;
        if list.is_empty() {
            self.state.unload();
            self.document.grid = empty_html();
            info!("No extensions to show");
            return;
        }

        info!(count = list.len(), "Extensions loaded");
        self.state.load(list);
        self.render_current();
    }

    pub async fn fetch_data(&self) -> Vec<Extension> {
        fetch_extensions(self.fetcher.as_ref(), &self.options.data_url, self.options.fetch_timeout).await
    }

    /// Show only records matching `filter`. Does nothing until a list has
    /// loaded; returns whether the view changed.
    pub fn filter_extensions(&mut self, filter: Filter) -> bool {
        if !self.state.is_loaded() {
            debug!(filter = %filter, "Filter ignored, nothing loaded");
            return false;
        }
        self.state.set_filter(filter);
        self.document.active_filter = filter;
        self.render_current();
        true
    }

    /// Remove a record. The current filter stays applied.
    pub fn remove_ext(&mut self, id: ExtensionId) -> Option<Extension> {
        let removed = self.state.remove(id)?;
        debug!(id = %id, name = %removed.name, "Extension removed");
        self.render_current();
        Some(removed)
    }

    /// Flip a record's active flag in memory and re-render.
    pub fn toggle_active(&mut self, id: ExtensionId) -> Option<bool> {
        let active = self.state.toggle_active(id)?;
        debug!(id = %id, active, "Extension toggled");
        self.render_current();
        Some(active)
    }

    fn stored_theme(&self) -> Theme {
        match self.prefs.get(THEME_KEY) {
            Ok(value) => Theme::from_stored(value.as_deref()),
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                Theme::Default
            }
        }
    }

    /// Apply the persisted theme to the document root.
    pub fn load_theme(&mut self) -> Theme {
        let theme = self.stored_theme();
        self.document.theme = theme;
        theme
    }

    /// Flip the persisted theme, apply it, and write it back. The new theme
    /// is applied even when writing it fails.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.stored_theme().toggled();
        self.document.theme = theme;
        self.prefs.set(THEME_KEY, theme.stored_value())?;
        Ok(theme)
    }

    /// Page shown again. Restored from the back/forward cache means a fresh
    /// data load; filter and theme stay as they are.
    pub async fn on_page_show(&mut self, persisted: bool) -> bool {
        if persisted {
            info!("Page restored, reloading extensions");
            self.load_extensions().await;
        }
        persisted
    }

    fn render_current(&mut self) {
        self.document.grid = if !self.state.is_loaded() {
            fetch_error_html()
        } else if self.state.all().is_empty() {
            empty_html()
        } else {
            render_html(self.state.visible())
        };
    }
}
