use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CacheError;
use crate::net::{Request, Response};

pub type CacheResult<T> = Result<T, CacheError>;

/// Identity of a cached request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn for_request(request: &Request) -> Self {
        Self::new(request.method.as_str(), request.url.as_str())
    }

    /// Convert to a filename-safe string
    pub fn to_filename(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        let hash = hasher.finalize();
        format!("{hash:x}")
    }
}

/// Everything about a stored response except its body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub key: CacheKey,
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub metadata: CacheMetadata,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(key: CacheKey, response: &Response) -> Self {
        Self {
            metadata: CacheMetadata {
                key,
                status: response.status,
                url: response.url.to_string(),
                headers: response.headers.clone(),
                cached_at: Utc::now(),
            },
            body: response.body.clone(),
        }
    }

    /// Rebuild the response exactly as it was stored.
    pub fn to_response(&self) -> Result<Response, url::ParseError> {
        Ok(Response {
            status: self.metadata.status,
            url: Url::parse(&self.metadata.url)?,
            headers: self.metadata.headers.clone(),
            body: self.body.clone(),
        })
    }
}
