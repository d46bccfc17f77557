//! Resource manifest - path → fingerprint map for a single build
//!
//! The manifest is a flat JSON object produced by an external build step:
//! keys are site-relative resource paths (the application root is denoted
//! `/`), values are opaque content fingerprints. A manifest is immutable
//! once published; each build supersedes the previous one wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Key under which the previously activated manifest is persisted in the
/// manifest bucket.
pub const MANIFEST_ENTRY: &str = "manifest";

/// A build's declared cache contents: resource path → content fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest(BTreeMap<String, String>);

impl ResourceManifest {
    /// Creates an empty manifest (useful in tests).
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a manifest from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Self::from_bytes(&content)
    }

    /// Parses a manifest from its serialized JSON form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::ManifestParse {
            reason: e.to_string(),
        })
    }

    /// Serializes the manifest to the JSON form persisted in the manifest
    /// bucket.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(self).map_err(|e| CacheError::ManifestParse {
            reason: e.to_string(),
        })
    }

    /// Returns the fingerprint recorded for a resource key.
    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the manifest lists the given resource key.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// All resource keys in the manifest, in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of listed resources.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the manifest lists no resources.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts an entry. Intended for constructing manifests in tests.
    #[allow(dead_code)]
    pub fn insert(&mut self, key: impl Into<String>, fingerprint: impl Into<String>) {
        self.0.insert(key.into(), fingerprint.into());
    }
}

impl FromIterator<(String, String)> for ResourceManifest {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_flat_json() {
        let mut m = ResourceManifest::new();
        m.insert("/", "5cd2e9bd86cf341f4dbc800e54bf3838");
        m.insert("main.dart.js", "641d9346e9ffc59f0ea9461fc172340d");

        let bytes = m.to_bytes().unwrap();
        let back = ResourceManifest::from_bytes(&bytes).unwrap();
        assert_eq!(m, back);

        // The wire form is a flat object, not a wrapper struct.
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            v.get("main.dart.js").and_then(|f| f.as_str()),
            Some("641d9346e9ffc59f0ea9461fc172340d")
        );
    }

    #[test]
    fn test_fingerprint_lookup() {
        let mut m = ResourceManifest::new();
        m.insert("index.html", "abc");
        assert_eq!(m.fingerprint("index.html"), Some("abc"));
        assert_eq!(m.fingerprint("missing"), None);
        assert!(m.contains("index.html"));
        assert!(!m.contains("missing"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(ResourceManifest::from_bytes(b"[1,2,3]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.json");
        std::fs::write(&path, r#"{"/": "aa", "app.js": "bb"}"#).unwrap();

        let m = ResourceManifest::load(&path).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.fingerprint("app.js"), Some("bb"));
    }
}
