use std::sync::Arc;

use tracing::warn;

use super::providers::CacheStorage;
use super::types::{CacheKey, CacheResult, CachedResponse};
use crate::net::{Method, Request, Response};

/// Handle on one named partition. Cheap to clone.
#[derive(Clone)]
pub struct CachePartition {
    name: String,
    storage: Arc<dyn CacheStorage>,
}

impl CachePartition {
    /// Open the partition, creating it if needed.
    pub async fn open(storage: Arc<dyn CacheStorage>, name: impl Into<String>) -> CacheResult<Self> {
        let name = name.into();
        storage.create(&name).await?;
        Ok(Self { name, storage })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for the request, if any. Only GET requests match.
    pub async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        if request.method != Method::GET {
            return Ok(None);
        }

        let key = CacheKey::for_request(request);
        let Some(entry) = self.storage.get(&self.name, &key).await? else {
            return Ok(None);
        };

        match entry.to_response() {
            Ok(response) => Ok(Some(response)),
            Err(e) => {
                warn!(url = %key.url, error = %e, "Stored response has an invalid URL, treating as miss");
                Ok(None)
            }
        }
    }

    /// Store a response for the request. Only GET requests can be stored.
    pub async fn put(&self, request: &Request, response: &Response) -> CacheResult<bool> {
        if request.method != Method::GET {
            return Ok(false);
        }
        let entry = CachedResponse::new(CacheKey::for_request(request), response);
        self.storage.put(&self.name, entry).await?;
        Ok(true)
    }

    pub async fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        self.storage.keys(&self.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use url::Url;

    #[tokio::test]
    async fn test_match_and_put() {
        let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
        let partition = CachePartition::open(storage.clone(), "browser-extension-v1").await.unwrap();
        assert!(storage.keys("browser-extension-v1").await.unwrap().is_empty());

        let url = Url::parse("http://site.test/script.js").unwrap();
        let req = Request::get(url.clone());
        assert!(partition.match_request(&req).await.unwrap().is_none());

        let response = Response::new(200, url, "console.log(1)");
        assert!(partition.put(&req, &response).await.unwrap());

        let hit = partition.match_request(&req).await.unwrap().unwrap();
        assert_eq!(hit.text(), "console.log(1)");
        assert_eq!(partition.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_get_never_stored_or_matched() {
        let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
        let partition = CachePartition::open(storage, "v1").await.unwrap();

        let url = Url::parse("http://site.test/data.json").unwrap();
        let post = Request::get(url.clone()).with_method(Method::POST);
        let response = Response::new(200, url, "{}");
        assert!(!partition.put(&post, &response).await.unwrap());
        assert!(partition.match_request(&post).await.unwrap().is_none());
        assert!(partition.keys().await.unwrap().is_empty());
    }
}
