//! Store module - Named cache buckets
//!
//! The worker keeps its three cache generations in named buckets behind
//! the `BucketStore` trait:
//! - `MemoryStore` for tests and embedding
//! - `DiskStore` for durable caches under the CLI's `--cache-dir`

pub mod disk;
pub mod memory;
pub mod meta;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::CacheError;

/// Named-bucket storage of resource-key → body pairs.
///
/// Buckets are disjoint; deleting one never touches another. All methods
/// take `&self`: implementations provide their own interior synchronization
/// so a single store value can back concurrent event handlers.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Opens a bucket, creating it if absent.
    async fn open(&self, bucket: &str) -> Result<(), CacheError>;

    /// Deletes a bucket and everything in it. Returns whether it existed.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError>;

    /// Lists the keys currently stored in a bucket, in stable order.
    /// An absent bucket lists as empty.
    async fn keys(&self, bucket: &str) -> Result<Vec<String>, CacheError>;

    /// Reads the body stored under `key`, if any.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `body` under `key`, overwriting any previous entry. The
    /// bucket is created if absent.
    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), CacheError>;

    /// Removes the entry under `key`. Returns whether it existed.
    async fn remove(&self, bucket: &str, key: &str) -> Result<bool, CacheError>;
}
