//! Worker registration and the task that answers intercepted requests.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

use super::controller::{FetchOutcome, OfflineCacheController, WorkerOptions, WorkerState};
use super::registry::{RegistrationRecord, Registry};
use crate::cache::{CachePartition, CacheStorage};
use crate::error::{FetchError, WorkerError};
use crate::net::{CacheMode, Destination, Fetch, Request};

/// Buffer size for the interception channel.
/// 32 comfortably covers a page load's burst of asset requests.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Whether the HTTP cache may answer update checks for the worker script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateViaCache {
    /// Imported scripts may come from the HTTP cache, the main script not
    #[default]
    Imports,
    All,
    /// Always fetch the script fresh
    None,
}

impl UpdateViaCache {
    fn cache_mode(&self) -> CacheMode {
        match self {
            UpdateViaCache::All => CacheMode::Default,
            UpdateViaCache::Imports | UpdateViaCache::None => CacheMode::NoStore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationOptions {
    pub script_url: Url,
    pub update_via_cache: UpdateViaCache,
}

enum WorkerMessage {
    Fetch {
        request: Request,
        reply: oneshot::Sender<Result<FetchOutcome, FetchError>>,
    },
    Shutdown,
}

/// Page-side handle on a running worker. Cheap to clone.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
    state: watch::Receiver<WorkerState>,
    partition: Option<CachePartition>,
    cache_name: String,
}

impl WorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Active
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Number of entries in the worker's partition.
    pub async fn cached_entries(&self) -> usize {
        match &self.partition {
            Some(partition) => partition.keys().await.map(|k| k.len()).unwrap_or_else(|e| {
                debug!(error = %e, "Failed to list cache entries");
                0
            }),
            None => 0,
        }
    }

    /// Hand a request to the worker and wait for its decision.
    pub async fn intercept(&self, request: Request) -> Result<FetchOutcome, FetchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WorkerMessage::Fetch { request, reply })
            .await
            .map_err(|_| FetchError::WorkerGone)?;
        rx.await.map_err(|_| FetchError::WorkerGone)?
    }

    /// Stop the worker task. Pending requests still get their answers.
    pub async fn shutdown(&self) {
        if self.tx.send(WorkerMessage::Shutdown).await.is_err() {
            debug!("Worker already stopped");
        }
    }
}

/// Run an activated controller on its own task.
pub fn spawn(controller: OfflineCacheController) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (state_tx, state_rx) = watch::channel(controller.state());
    let partition = controller.partition().cloned();
    let cache_name = controller.options().cache_name.clone();
    let controller = Arc::new(controller);

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Fetch { request, reply } => {
                    // Requests are independent; one slow fetch must not hold up the rest.
                    let controller = controller.clone();
                    tokio::spawn(async move {
                        let outcome = controller.handle_fetch(request).await;
                        if reply.send(outcome).is_err() {
                            debug!("Requester went away before the worker answered");
                        }
                    });
                }
                WorkerMessage::Shutdown => break,
            }
        }
        state_tx.send_replace(WorkerState::Redundant);
        info!("Worker stopped");
    });

    WorkerHandle {
        tx,
        state: state_rx,
        partition,
        cache_name,
    }
}

/// Register the worker for its scope: fetch the script, install, activate,
/// persist the registration and start the task.
///
/// A failed update falls back to the previously registered worker when
/// there is one for the same script. Otherwise the error is returned and
/// the page simply stays uncontrolled.
pub async fn register(
    registration: &RegistrationOptions,
    options: WorkerOptions,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Fetch>,
    registry: &mut Registry,
) -> Result<WorkerHandle, WorkerError> {
    let script_url = registration.script_url.to_string();
    let previous = registry.record_for(&script_url).cloned();

    let script_request = Request::get(registration.script_url.clone())
        .with_destination(Destination::Script)
        .with_cache_mode(registration.update_via_cache.cache_mode());

    let script_error = match network.fetch(script_request).await {
        Ok(response) if response.is_ok() => None,
        Ok(response) => Some(FetchError::from_status(response.status, &response.text())),
        Err(e) => Some(e),
    };

    if let Some(source) = script_error {
        let error = WorkerError::Script { url: script_url, source };
        return resume_or(error, previous, options, storage, network).await;
    }

    let mut controller = OfflineCacheController::new(options, storage.clone(), network.clone());
    if let Err(error) = controller.install().await {
        return resume_or(error, previous, controller.options().clone(), storage, network).await;
    }
    controller.activate().await?;

    registry.record = Some(RegistrationRecord {
        scope: controller.options().scope.to_string(),
        script_url,
        cache_name: controller.options().cache_name.clone(),
        activated_at: Utc::now(),
    });
    if let Err(e) = registry.save() {
        warn!(error = %e, "Failed to persist worker registration");
    }

    Ok(spawn(controller))
}

async fn resume_or(
    error: WorkerError,
    previous: Option<RegistrationRecord>,
    options: WorkerOptions,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Fetch>,
) -> Result<WorkerHandle, WorkerError> {
    let Some(previous) = previous else {
        return Err(error);
    };

    warn!(
        error = %error,
        cache = %previous.cache_name,
        "Worker update failed, keeping previous registration"
    );

    let options = WorkerOptions {
        cache_name: previous.cache_name,
        ..options
    };
    let mut controller = OfflineCacheController::new(options, storage, network);
    controller.resume().await?;
    Ok(spawn(controller))
}
