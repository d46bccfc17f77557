//! Error types for cache and fetch operations.

use std::path::PathBuf;

/// Errors produced by the bucket store, the fetcher, and the worker
/// lifecycle.
///
/// Install errors propagate to the caller unchanged. Activation errors are
/// caught once by the worker and escalated into a full wipe of all cache
/// buckets.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error while reading or writing store files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A bucket-level store failure (missing bucket, corrupt index).
    #[error("store error in bucket '{bucket}': {reason}")]
    Store {
        /// The bucket involved.
        bucket: String,
        /// Description of the failure.
        reason: String,
    },

    /// A network fetch failed outright (unreachable, missing resource).
    #[error("fetch failed for '{key}': {reason}")]
    Fetch {
        /// The resource key that was requested.
        key: String,
        /// Description of the failure.
        reason: String,
    },

    /// The resource manifest could not be parsed.
    #[error("failed to parse resource manifest: {reason}")]
    ManifestParse {
        /// Description of the parse failure.
        reason: String,
    },
}

impl CacheError {
    /// Convenience constructor for I/O errors carrying the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Convenience constructor for store errors.
    pub fn store(bucket: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            bucket: bucket.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for fetch failures.
    pub fn fetch(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
