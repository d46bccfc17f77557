//! Request key normalization
//!
//! Maps intercepted request URLs to site-relative resource keys, the form
//! used by the resource manifest and the cache buckets. The application
//! root (bare origin, or a fragment-only navigation like `origin/#route`)
//! normalizes to the sentinel key `/`.

/// Sentinel key for the application root document.
pub const ROOT_KEY: &str = "/";

/// Derive the site-relative resource key for a request URL.
///
/// Returns `None` for cross-origin URLs, which must never be intercepted.
/// A trailing cache-busting query suffix of the form `?v=...` is stripped
/// before the key is produced.
pub fn request_key(origin: &str, url: &str) -> Option<String> {
    let origin = origin.trim_end_matches('/');

    if url == origin {
        return Some(ROOT_KEY.to_string());
    }

    let rest = url.strip_prefix(origin)?.strip_prefix('/')?;

    let key = match rest.find("?v=") {
        Some(idx) => &rest[..idx],
        None => rest,
    };

    if key.is_empty() || key.starts_with('#') {
        return Some(ROOT_KEY.to_string());
    }

    Some(key.to_string())
}

/// Normalize a key read back from a cache bucket.
///
/// The empty key is the stored form of the application root and maps to
/// the root sentinel.
pub fn normalize_stored_key(key: &str) -> &str {
    if key.is_empty() {
        ROOT_KEY
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://localhost";

    #[test]
    fn test_plain_resource_key() {
        assert_eq!(
            request_key(ORIGIN, "http://localhost/main.dart.js"),
            Some("main.dart.js".to_string())
        );
    }

    #[test]
    fn test_nested_resource_key() {
        assert_eq!(
            request_key(ORIGIN, "http://localhost/assets/FontManifest.json"),
            Some("assets/FontManifest.json".to_string())
        );
    }

    #[test]
    fn test_version_suffix_is_stripped() {
        assert_eq!(
            request_key(ORIGIN, "http://localhost/main.dart.js?v=3"),
            Some("main.dart.js".to_string())
        );
    }

    #[test]
    fn test_bare_origin_is_root() {
        assert_eq!(
            request_key(ORIGIN, "http://localhost"),
            Some("/".to_string())
        );
        assert_eq!(
            request_key(ORIGIN, "http://localhost/"),
            Some("/".to_string())
        );
    }

    #[test]
    fn test_fragment_navigation_is_root() {
        assert_eq!(
            request_key(ORIGIN, "http://localhost/#menu"),
            Some("/".to_string())
        );
    }

    #[test]
    fn test_cross_origin_is_not_intercepted() {
        assert_eq!(request_key(ORIGIN, "https://api.example.com/orders"), None);
    }

    #[test]
    fn test_trailing_slash_origin() {
        assert_eq!(
            request_key("http://localhost/", "http://localhost/index.html"),
            Some("index.html".to_string())
        );
    }

    #[test]
    fn test_normalize_stored_key() {
        assert_eq!(normalize_stored_key(""), "/");
        assert_eq!(normalize_stored_key("index.html"), "index.html");
    }
}
