//! Directory-backed fetcher
//!
//! Serves resource keys from a local origin directory, standing in for the
//! network when the worker is driven from the CLI. A missing file is a
//! network failure, not a 404: the origin directory is the deployed asset
//! set, so absence means the "host" cannot serve the resource at all.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::core::paths::ROOT_KEY;
use crate::error::CacheError;
use crate::fetch::{FetchMode, FetchResponse, Fetcher};

/// Document served when the root sentinel key is fetched.
const ROOT_DOCUMENT: &str = "index.html";

/// Fetcher that reads resources from an origin directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    origin_dir: PathBuf,
    /// When set, every fetch fails, simulating a lost network.
    offline: bool,
}

impl DirFetcher {
    /// Creates a fetcher rooted at the given origin directory.
    pub fn new(origin_dir: impl Into<PathBuf>) -> Self {
        Self {
            origin_dir: origin_dir.into(),
            offline: false,
        }
    }

    /// Switches the fetcher into offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    fn resource_path(&self, key: &str) -> PathBuf {
        let rel = if key == ROOT_KEY { ROOT_DOCUMENT } else { key };
        self.origin_dir.join(Path::new(rel))
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, key: &str, mode: FetchMode) -> Result<FetchResponse, CacheError> {
        if self.offline {
            return Err(CacheError::fetch(key, "network unavailable"));
        }

        let path = self.resource_path(key);
        debug!(key, mode = ?mode, path = %path.display(), "origin fetch");

        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| CacheError::fetch(key, format!("{}: {e}", path.display())))?;

        Ok(FetchResponse::ok_with(body))
    }
}
