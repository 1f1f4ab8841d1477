//! Application state for the extshelf terminal front-end.
//!
//! `App` owns the [`Runtime`] (page, worker and network switch) plus the UI
//! state around it: overlays, the selected card and the status line. The data
//! fetch runs on a background task and reports back over a channel, so the
//! skeleton grid stays on screen while it is in flight.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use extshelf_core::models::{Extension, ExtensionEntry, Filter, Theme};
use extshelf_core::page::fetch_extensions;
use extshelf_core::Runtime;

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Results sent back from background tasks.
enum BackgroundResult {
    /// Data fetch finished; `generation` guards against stale loads
    Extensions { generation: u64, list: Vec<Extension> },
    /// Entry count of the worker's cache partition
    CacheEntries(usize),
}

pub struct App {
    runtime: Runtime,
    pub state: AppState,
    /// Index into the visible cards
    pub selection: usize,
    pub status_message: Option<String>,
    pub cached_entries: usize,
    load_generation: u64,
    background_rx: mpsc::Receiver<BackgroundResult>,
    background_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    pub fn new(runtime: Runtime) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            runtime,
            state: AppState::Normal,
            selection: 0,
            status_message: None,
            cached_entries: 0,
            load_generation: 0,
            background_rx: rx,
            background_tx: tx,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn theme(&self) -> Theme {
        self.runtime.page().document().theme
    }

    pub fn filter(&self) -> Filter {
        self.runtime.page().state().filter()
    }

    pub fn is_loading(&self) -> bool {
        self.runtime.page().is_loading()
    }

    pub fn visible(&self) -> Vec<&ExtensionEntry> {
        self.runtime.page().state().visible()
    }

    pub fn is_online(&self) -> bool {
        self.runtime.is_online()
    }

    /// Apply the stored theme and kick off the first load.
    pub fn mount(&mut self) {
        self.runtime.page_mut().load_theme();
        self.start_load();
    }

    /// Show the skeleton grid and fetch the data on a background task.
    pub fn start_load(&mut self) {
        self.runtime.page_mut().begin_load();
        self.load_generation += 1;

        let generation = self.load_generation;
        let page = self.runtime.page();
        let fetcher = page.fetcher();
        let url = page.options().data_url.clone();
        let timeout = page.options().fetch_timeout;
        let tx = self.background_tx.clone();

        tokio::spawn(async move {
            let list = fetch_extensions(fetcher.as_ref(), &url, timeout).await;
            if tx.send(BackgroundResult::Extensions { generation, list }).await.is_err() {
                debug!("App gone before the load finished");
            }
        });

        self.status_message = Some("Loading extensions...".to_string());
    }

    /// Page restored: reload the data, keep filter and theme.
    pub fn reload(&mut self) {
        info!("Reloading extensions");
        self.start_load();
    }

    fn refresh_cache_stats(&self) {
        let Some(worker) = self.runtime.worker().cloned() else {
            return;
        };
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let count = worker.cached_entries().await;
            if tx.send(BackgroundResult::CacheEntries(count)).await.is_err() {
                debug!("App gone before the cache count arrived");
            }
        });
    }

    /// Drain finished background work into the app state.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.background_rx.try_recv() {
            self.process_background_result(result);
        }
    }

    fn process_background_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Extensions { generation, list } => {
                if generation != self.load_generation {
                    debug!(generation, "Dropping stale load");
                    return;
                }
                let count = list.len();
                self.runtime.page_mut().finish_load(list);
                self.clamp_selection();
                self.status_message = Some(match count {
                    0 => "No extensions loaded".to_string(),
                    1 => "Loaded 1 extension".to_string(),
                    n => format!("Loaded {} extensions", n),
                });
                self.refresh_cache_stats();
            }
            BackgroundResult::CacheEntries(count) => {
                self.cached_entries = count;
            }
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if self.runtime.page_mut().filter_extensions(filter) {
            self.selection = 0;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.selection + 1 < len {
            self.selection += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selection = self.selection.saturating_sub(1);
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.visible().get(self.selection).map(|e| e.id) else {
            return;
        };
        if let Some(removed) = self.runtime.page_mut().remove_ext(id) {
            self.status_message = Some(format!("Removed {}", removed.name));
        }
        self.clamp_selection();
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.visible().get(self.selection).map(|e| e.id) else {
            return;
        };
        self.runtime.page_mut().toggle_active(id);
        self.clamp_selection();
    }

    pub fn toggle_theme(&mut self) {
        match self.runtime.page_mut().toggle_theme() {
            Ok(theme) => debug!(?theme, "Theme toggled"),
            Err(e) => {
                warn!(error = %e, "Failed to save theme");
                self.status_message = Some(format!("Error: {}", e));
            }
        }
    }

    pub fn toggle_online(&mut self) {
        let online = self.runtime.toggle_online();
        self.status_message = Some(if online {
            "Network online".to_string()
        } else {
            "Network offline".to_string()
        });
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selection = self.selection.min(len.saturating_sub(1));
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.runtime.shutdown().await;
        Ok(())
    }
}
