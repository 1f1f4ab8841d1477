//! Serves a local site directory as if it were the origin.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::request::content_type_for;
use super::{Fetch, Method, Request, Response};
use crate::error::FetchError;

/// File served for directory requests
const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL path onto the site directory, refusing to leave it.
    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let relative = url_path.trim_start_matches('/');
        let relative = if relative.is_empty() || relative.ends_with('/') {
            format!("{}{}", relative, INDEX_FILE)
        } else {
            relative.to_string()
        };

        let mut path = self.root.clone();
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }
}

#[async_trait]
impl Fetch for DirFetcher {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Ok(Response::new(405, request.url, "Method Not Allowed"));
        }

        let Some(path) = self.resolve(request.url.path()) else {
            return Ok(Response::new(403, request.url, "Forbidden"));
        };

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                debug!(path = ?path, bytes = contents.len(), "Serving file");
                let body = if request.method == Method::HEAD { Vec::new() } else { contents };
                Ok(Response::new(200, request.url, body)
                    .with_header("content-type", content_type_for(&path.to_string_lossy())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?path, "File not found");
                Ok(Response::new(404, request.url, "Not Found"))
            }
            Err(e) => Err(e.into()),
        }
    }
}
