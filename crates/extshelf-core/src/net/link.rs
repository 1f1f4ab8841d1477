use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{Fetch, Request, Response};
use crate::error::FetchError;

/// A transport that can be unplugged. While offline every request fails
/// with [`FetchError::Offline`] without reaching the inner transport.
pub struct Link {
    inner: Arc<dyn Fetch>,
    online: AtomicBool,
}

impl Link {
    pub fn new(inner: Arc<dyn Fetch>) -> Self {
        Self {
            inner,
            online: AtomicBool::new(true),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    /// Flip the link state, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.online.fetch_xor(true, Ordering::AcqRel)
    }
}

#[async_trait]
impl Fetch for Link {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        if !self.is_online() {
            return Err(FetchError::Offline(request.url.to_string()));
        }
        self.inner.fetch(request).await
    }
}
