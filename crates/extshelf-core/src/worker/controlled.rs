use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::controller::FetchOutcome;
use super::service::WorkerHandle;
use crate::error::FetchError;
use crate::net::{Fetch, Request, Response};

/// The page's view of the network: requests go through the controlling
/// worker when there is one, straight to the network otherwise.
pub struct ControlledFetch {
    worker: Option<WorkerHandle>,
    network: Arc<dyn Fetch>,
}

impl ControlledFetch {
    pub fn new(network: Arc<dyn Fetch>) -> Self {
        Self {
            worker: None,
            network,
        }
    }

    pub fn with_worker(mut self, worker: Option<WorkerHandle>) -> Self {
        self.worker = worker;
        self
    }

    pub fn is_controlled(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_active())
    }
}

#[async_trait]
impl Fetch for ControlledFetch {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        if let Some(worker) = self.worker.as_ref().filter(|w| w.is_active()) {
            match worker.intercept(request.clone()).await {
                Ok(FetchOutcome::Respond { response, .. }) => return Ok(response),
                Ok(FetchOutcome::PassThrough) => {}
                Err(FetchError::WorkerGone) => {
                    warn!(url = %request.url, "Worker stopped, falling back to network");
                }
                Err(e) => return Err(e),
            }
        }
        self.network.fetch(request).await
    }
}
