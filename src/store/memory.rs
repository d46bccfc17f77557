//! In-memory bucket store
//!
//! Backing store for unit tests and in-process embedding. Buckets live in
//! a single mutex-guarded map; operations are cheap enough that holding
//! the lock across an operation is fine.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::store::BucketStore;

type Bucket = BTreeMap<String, Vec<u8>>;

/// Bucket store held entirely in memory.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
}

#[allow(dead_code)]
impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Bucket>> {
        // A poisoned lock means a panic mid-operation; tests should see it.
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        self.lock().entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        Ok(self.lock().remove(bucket).is_some())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .lock()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock().get(bucket).and_then(|b| b.get(key).cloned()))
    }

    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), CacheError> {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<bool, CacheError> {
        Ok(self
            .lock()
            .get_mut(bucket)
            .map(|b| b.remove(key).is_some())
            .unwrap_or(false))
    }
}
