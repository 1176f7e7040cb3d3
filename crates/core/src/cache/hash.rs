//! Request key generation.

use http::Method;
use sha2::{Digest, Sha256};
use url::Url;

/// Identity of a request inside a partition.
///
/// `hash` is the lookup key; `method` and `url` are kept alongside for
/// listing and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub hash: String,
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Key on method + URL, fragment removed.
    pub fn exact(method: &Method, url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        Self::from_normalized(method, normalized)
    }

    /// Key on method + URL with both query and fragment removed.
    pub fn ignoring_query(method: &Method, url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized.set_query(None);
        Self::from_normalized(method, normalized)
    }

    fn from_normalized(method: &Method, url: Url) -> Self {
        let method = method.as_str().to_ascii_uppercase();
        let url = url.to_string();
        Self { hash: compute_request_key(&method, &url), method, url }
    }
}

/// SHA-256 over `METHOD \n URL`, hex encoded.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = RequestKey::exact(&Method::GET, &url("https://herbs.example/models/tulsi.glb"));
        let b = RequestKey::exact(&Method::GET, &url("https://herbs.example/models/tulsi.glb"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_depends_on_method() {
        let get = RequestKey::exact(&Method::GET, &url("https://herbs.example/api/plants"));
        let head = RequestKey::exact(&Method::HEAD, &url("https://herbs.example/api/plants"));
        assert_ne!(get.hash, head.hash);
    }

    #[test]
    fn test_fragment_is_ignored() {
        let a = RequestKey::exact(&Method::GET, &url("https://herbs.example/about#team"));
        let b = RequestKey::exact(&Method::GET, &url("https://herbs.example/about"));
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.url, "https://herbs.example/about");
    }

    #[test]
    fn test_query_matters_unless_ignored() {
        let with_query = url("https://herbs.example/?utm_source=pwa");
        let bare = url("https://herbs.example/");
        assert_ne!(RequestKey::exact(&Method::GET, &with_query).hash, RequestKey::exact(&Method::GET, &bare).hash);
        assert_eq!(
            RequestKey::ignoring_query(&Method::GET, &with_query).hash,
            RequestKey::exact(&Method::GET, &bare).hash
        );
    }

    #[test]
    fn test_hash_format() {
        let key = RequestKey::exact(&Method::GET, &url("https://herbs.example/"));
        assert_eq!(key.hash.len(), 64);
        assert!(key.hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
