//! Offline cache worker.
//!
//! - `controller`: the install/activate/fetch state machine
//! - `service`: registration and the task answering intercepted requests
//! - `registry`: persisted registration, so a failed update keeps the old worker
//! - `controlled`: the page-side `Fetch` that routes through the worker

pub mod controlled;
pub mod controller;
pub mod registry;
pub mod service;

pub use controlled::ControlledFetch;
pub use controller::{FetchOutcome, OfflineCacheController, ResponseSource, WorkerOptions, WorkerState};
pub use registry::{RegistrationRecord, Registry};
pub use service::{register, spawn, RegistrationOptions, UpdateViaCache, WorkerHandle};
