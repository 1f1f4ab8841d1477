//! The platform HTTP cache.
//!
//! Sits between every requester and the transport. Freshness is not
//! modelled: a stored response is either used (`force-cache`) or refreshed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheMode, Fetch, Method, Request, Response};
use crate::error::FetchError;

pub struct HttpCache {
    inner: Arc<dyn Fetch>,
    entries: RwLock<HashMap<String, Response>>,
}

impl HttpCache {
    pub fn new(inner: Arc<dyn Fetch>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Keyed by the requested URL, which may differ from a redirected `response.url`.
    async fn store(&self, key: String, response: &Response) {
        if response.is_ok() {
            self.entries.write().await.insert(key, response.clone());
        }
    }
}

#[async_trait]
impl Fetch for HttpCache {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        if request.method != Method::GET {
            return self.inner.fetch(request).await;
        }

        let key = request.url.to_string();
        match request.cache_mode {
            CacheMode::ForceCache => {
                if let Some(hit) = self.entries.read().await.get(&key).cloned() {
                    debug!(url = %key, "HTTP cache hit");
                    return Ok(hit);
                }
                let response = self.inner.fetch(request).await?;
                self.store(key, &response).await;
                Ok(response)
            }
            CacheMode::Default => {
                let response = self.inner.fetch(request).await?;
                self.store(key, &response).await;
                Ok(response)
            }
            CacheMode::NoStore => self.inner.fetch(request).await,
        }
    }
}
