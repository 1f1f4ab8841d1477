//! HTTP transport for a remote origin.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Fetch, Request, Response};
use crate::error::FetchError;

/// HTTP request timeout in seconds.
/// Callers that need a tighter bound (the data fetch) wrap the call themselves.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        debug!(method = %request.method, url = %request.url, "HTTP request");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(url = %url, status, bytes = body.len(), "HTTP response");

        Ok(Response {
            status,
            url,
            headers,
            body,
        })
    }
}
