//! Durable bucket store under a cache directory
//!
//! Layout:
//! - `<cache-dir>/meta.json` stores the format version and creation time
//! - `<cache-dir>/<bucket>/index.json` maps resource key to entry file stem
//! - `<cache-dir>/<bucket>/<stem>.bin` holds the entry body bytes
//!
//! Resource keys contain slashes and query-ish characters, so bodies are
//! filed under the xxh3 of the key and the index maps back to them.
//! Opening a store with a mismatched format version wipes it and starts
//! fresh rather than failing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::core::util::key_stem;
use crate::error::CacheError;
use crate::store::meta::{StoreMeta, STORE_VERSION};
use crate::store::BucketStore;

/// Store metadata file name.
const META_FILE: &str = "meta.json";

/// Per-bucket index file name.
const INDEX_FILE: &str = "index.json";

type BucketIndex = BTreeMap<String, String>;

/// Bucket store persisted under a cache directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Opens the store at `root`, creating it if absent.
    ///
    /// A store written by an incompatible version has its own artifacts
    /// (the bucket directories and `meta.json`) wiped and is recreated
    /// empty; stale layouts surface as cold caches. A non-empty directory
    /// that was never a store is refused outright, so pointing the store
    /// at an unrelated directory can never destroy its contents.
    pub async fn open_or_create(root: &Path) -> Result<Self, CacheError> {
        let store = Self {
            root: root.to_path_buf(),
        };
        let meta_path = root.join(META_FILE);

        match tokio::fs::read(&meta_path).await {
            Ok(bytes) => {
                let current = serde_json::from_slice::<StoreMeta>(&bytes)
                    .map(|m| m.store_version == STORE_VERSION)
                    .unwrap_or(false);
                if current {
                    return Ok(store);
                }
                warn!(root = %root.display(), "incompatible cache store, recreating");
                store.wipe_artifacts().await?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if dir_is_nonempty(root).await? {
                    return Err(CacheError::store(
                        "meta",
                        format!("{} exists but is not a cache store", root.display()),
                    ));
                }
            }
            Err(e) => return Err(CacheError::io(meta_path, e)),
        }

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| CacheError::io(root, e))?;

        let meta = StoreMeta::new();
        let json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| CacheError::store("meta", e.to_string()))?;
        tokio::fs::write(&meta_path, json)
            .await
            .map_err(|e| CacheError::io(meta_path, e))?;

        Ok(store)
    }

    /// Removes this store's own artifacts only: `meta.json` and every
    /// subdirectory carrying a bucket index. Unrelated files sharing the
    /// directory are left alone.
    async fn wipe_artifacts(&self) -> Result<(), CacheError> {
        let meta_path = self.root.join(META_FILE);
        tokio::fs::remove_file(&meta_path)
            .await
            .map_err(|e| CacheError::io(&meta_path, e))?;

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| CacheError::io(&path, e))?
                .is_dir();
            if is_dir && tokio::fs::metadata(path.join(INDEX_FILE)).await.is_ok() {
                tokio::fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| CacheError::io(path, e))?;
            }
        }
        Ok(())
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    async fn read_index(&self, bucket: &str) -> Result<BucketIndex, CacheError> {
        let path = self.bucket_dir(bucket).join(INDEX_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CacheError::store(bucket, format!("corrupt index: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BucketIndex::new()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    async fn write_index(&self, bucket: &str, index: &BucketIndex) -> Result<(), CacheError> {
        let dir = self.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(&dir, e))?;

        let json = serde_json::to_vec(index)
            .map_err(|e| CacheError::store(bucket, e.to_string()))?;
        let path = dir.join(INDEX_FILE);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| CacheError::io(path, e))
    }
}

async fn dir_is_nonempty(path: &Path) -> Result<bool, CacheError> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(CacheError::io(path, e)),
    };
    let first = entries
        .next_entry()
        .await
        .map_err(|e| CacheError::io(path, e))?;
    Ok(first.is_some())
}

#[async_trait]
impl BucketStore for DiskStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        let dir = self.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(dir, e))
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let dir = self.bucket_dir(bucket);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(dir, e)),
        }
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.read_index(bucket).await?.into_keys().collect())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let index = self.read_index(bucket).await?;
        let Some(stem) = index.get(key) else {
            return Ok(None);
        };

        let path = self.bucket_dir(bucket).join(format!("{stem}.bin"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            // Index without body: treat as a miss, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), CacheError> {
        let mut index = self.read_index(bucket).await?;
        let stem = key_stem(key);

        let dir = self.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(&dir, e))?;

        let path = dir.join(format!("{stem}.bin"));
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CacheError::io(path, e))?;

        index.insert(key.to_string(), stem);
        self.write_index(bucket, &index).await
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<bool, CacheError> {
        let mut index = self.read_index(bucket).await?;
        let Some(stem) = index.remove(key) else {
            return Ok(false);
        };

        // Body file may already be gone; the index is authoritative.
        let path = self.bucket_dir(bucket).join(format!("{stem}.bin"));
        let _ = tokio::fs::remove_file(&path).await;

        self.write_index(bucket, &index).await?;
        Ok(true)
    }
}
