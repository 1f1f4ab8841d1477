//! Core library for extshelf.
//!
//! extshelf manages a list of extension records fetched from a static JSON
//! document and keeps the site's assets usable offline. Two cooperating
//! tasks make up the system:
//!
//! - `page`: the page controller. Owns the loaded list and the current
//!   filter, renders grid markup, and handles filter/remove/theme actions.
//! - `worker`: the offline cache controller. Intercepts requests issued by
//!   the page, serves cached static assets and fills the cache on misses.
//!
//! The two never call each other directly; the page's requests flow through
//! [`worker::ControlledFetch`], which hands them to the worker task over a
//! channel and falls back to the network when the worker passes.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod models;
pub mod net;
pub mod page;
pub mod runtime;
pub mod utils;
pub mod worker;

pub use config::Config;
pub use error::{CacheError, FetchError, WorkerError};
pub use page::Page;
pub use runtime::Runtime;
