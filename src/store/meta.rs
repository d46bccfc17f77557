//! Store metadata management

use serde::{Deserialize, Serialize};

/// Metadata stored in `meta.json` at the root of a disk store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    /// On-disk layout version; the store is wiped when it changes.
    pub store_version: String,

    /// Timestamp when the store was created (ms since epoch).
    pub created_at: i64,
}

impl StoreMeta {
    pub fn new() -> Self {
        Self {
            store_version: STORE_VERSION.to_string(),
            created_at: crate::core::util::now_ms(),
        }
    }
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Current on-disk layout version.
pub const STORE_VERSION: &str = "1";
