//! Common utilities

use xxhash_rust::xxh3::xxh3_64;

/// Compute a short stable hash of bytes, used for entry file names
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:016x}", xxh3_64(data))
}

/// Compute the entry file stem for a resource key
pub fn key_stem(key: &str) -> String {
    hash_bytes(key.as_bytes())
}

/// Current time in milliseconds since epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
