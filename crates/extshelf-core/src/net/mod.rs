//! Fetch stack shared by the page and the offline cache worker.
//!
//! Everything that leaves the page goes through the [`Fetch`] trait:
//!
//! - `HttpFetcher`: reqwest transport against a remote origin
//! - `DirFetcher`: serves a local site directory as an origin
//! - `Loopback`: in-memory origin with scripted routes
//! - `Link`: wraps a transport with an online/offline switch
//! - `HttpCache`: the platform HTTP cache honouring per-request cache modes

pub mod dir;
pub mod http;
pub mod http_cache;
pub mod link;
pub mod loopback;
pub mod request;

use async_trait::async_trait;

use crate::error::FetchError;

pub use dir::DirFetcher;
pub use http::HttpFetcher;
pub use http_cache::HttpCache;
pub use link::Link;
pub use loopback::Loopback;
pub use request::{CacheMode, Destination, Method, Request, Response};

/// Something that turns a request into a response.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError>;
}
