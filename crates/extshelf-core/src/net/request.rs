use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::FetchError;

pub use reqwest::Method;

/// What kind of resource the requester intends to use the response as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Top-level navigation
    Document,
    Style,
    Script,
    Image,
    /// Programmatic fetch, no specific destination
    Empty,
}

/// How a request interacts with the platform HTTP cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Go to the network, store successful responses
    #[default]
    Default,
    /// Use any stored response regardless of age, network only on a miss
    ForceCache,
    /// Bypass the HTTP cache entirely
    NoStore,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub cache_mode: CacheMode,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            destination: Destination::Empty,
            cache_mode: CacheMode::Default,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Cloning shares the underlying buffer.
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            url,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| FetchError::InvalidResponse(format!("{}: {}", self.url, e)))
    }
}

/// Guess a content type from a path's extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
