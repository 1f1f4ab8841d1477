//! In-memory origin with scripted routes.
//!
//! Used by the test suites and by demos that should not touch the network.
//! Every request is recorded so callers can tell whether a response came
//! from the origin or from a cache in front of it.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use super::request::content_type_for;
use super::{Fetch, Request, Response};
use crate::error::FetchError;

#[derive(Debug, Clone)]
enum Route {
    Static { status: u16, body: Bytes },
    /// Never answers; the caller has to give up on its own.
    Hang,
}

pub struct Loopback {
    base: Url,
    routes: Mutex<HashMap<String, Route>>,
    log: Mutex<Vec<String>>,
}

impl Loopback {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            routes: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base)?))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path on this origin.
    pub fn url(&self, path: &str) -> Url {
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    pub fn serve(&self, path: &str, body: impl Into<Bytes>) {
        self.serve_status(path, 200, body);
    }

    pub fn serve_status(&self, path: &str, status: u16, body: impl Into<Bytes>) {
        self.set_route(path, Route::Static { status, body: body.into() });
    }

    pub fn hang(&self, path: &str) {
        self.set_route(path, Route::Hang);
    }

    pub fn remove(&self, path: &str) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.remove(&self.route_key(path));
        }
    }

    /// Number of requests that reached the origin for a path.
    pub fn hits(&self, path: &str) -> usize {
        let key = self.route_key(path);
        self.log
            .lock()
            .map(|log| log.iter().filter(|p| **p == key).count())
            .unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn set_route(&self, path: &str, route: Route) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(self.route_key(path), route);
        }
    }

    fn route_key(&self, path: &str) -> String {
        self.url(path).path().to_string()
    }
}

#[async_trait]
impl Fetch for Loopback {
    async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        let path = request.url.path().to_string();
        if let Ok(mut log) = self.log.lock() {
            log.push(path.clone());
        }

        let route = self.routes.lock().ok().and_then(|routes| routes.get(&path).cloned());

        match route {
            Some(Route::Static { status, body }) => Ok(Response::new(status, request.url, body)
                .with_header("content-type", content_type_for(&path))),
            Some(Route::Hang) => std::future::pending().await,
            None => Ok(Response::new(404, request.url, "Not Found")),
        }
    }
}
