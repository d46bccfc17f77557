//! Fetch module - Network retrieval seam for the cache worker
//!
//! Provides:
//! - The async `Fetcher` trait the worker retrieves resources through
//! - `FetchMode` (normal vs. cache-bypassing revalidation during install)
//! - `DirFetcher`, the CLI's origin-directory implementation

pub mod dir;

pub use dir::DirFetcher;

use async_trait::async_trait;

use crate::error::CacheError;

/// How a fetch should interact with intermediate caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Ordinary retrieval.
    Normal,
    /// Bypass intermediate caches and revalidate against the network.
    /// Used for every core-set fetch during install.
    Reload,
}

/// A retrieved resource: status code plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Builds a successful (200) response around a body.
    pub fn ok_with(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    /// Whether the status indicates success (2xx). Only successful
    /// responses may be written into the content cache.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous resource retrieval, keyed by site-relative resource key.
///
/// An `Err` models a network failure (host unreachable, resource missing
/// at the origin); an `Ok` with a non-2xx status models a reachable origin
/// answering unsuccessfully.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the resource for `key`.
    async fn fetch(&self, key: &str, mode: FetchMode) -> Result<FetchResponse, CacheError>;
}
