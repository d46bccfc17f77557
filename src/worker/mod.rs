//! Worker module - Versioned cache lifecycle
//!
//! Provides:
//! - `CacheWorker`, the install / activate / fetch / message lifecycle
//! - Request and interception types for the fetch path
//!
//! The worker owns three named cache generations: a temporary staging
//! bucket filled during install, the durable content bucket served to the
//! application, and a manifest bucket holding the previously activated
//! resource manifest for upgrade diffing.

pub mod manager;
pub mod request;

pub use manager::{CacheWorker, CONTENT_BUCKET, MANIFEST_BUCKET, TEMP_BUCKET};
pub use request::{Intercepted, Request, ResponseSource};

/// Control message that forces the worker to supersede an older active
/// generation immediately.
pub const MSG_SKIP_WAITING: &str = "skipWaiting";

/// Control message that triggers a best-effort background fill of every
/// manifest resource not yet cached.
pub const MSG_DOWNLOAD_OFFLINE: &str = "downloadOffline";
