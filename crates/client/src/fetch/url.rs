//! Origin URL handling.

use url::Url;

/// Error type for origin URL failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an origin.
///
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to http:// if missing
/// 3. Lowercase the host
/// 4. Drop path, query and fragment
pub fn canonicalize_origin(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("http://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Place a request target (`/path?query`) onto an origin.
///
/// Unlike `Url::join`, a target such as `//other.host/x` stays on the origin.
pub fn rebase(origin: &Url, target: &str) -> Result<Url, UrlError> {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let path = path.split('#').next().unwrap_or_default();

    if !path.starts_with('/') {
        return Err(UrlError::InvalidUrl(format!("request target must start with '/': {target}")));
    }

    let mut url = origin.clone();
    url.set_path(path);
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_origin_basic() {
        let url = canonicalize_origin("https://herbs.example").unwrap();
        assert_eq!(url.as_str(), "https://herbs.example/");
    }

    #[test]
    fn test_canonicalize_origin_default_scheme() {
        let url = canonicalize_origin("127.0.0.1:3000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/");
    }

    #[test]
    fn test_canonicalize_origin_lowercase_and_strip() {
        let url = canonicalize_origin("  HTTPS://Herbs.Example/app?x=1#top ").unwrap();
        assert_eq!(url.as_str(), "https://herbs.example/");
    }

    #[test]
    fn test_canonicalize_origin_rejects() {
        assert!(matches!(canonicalize_origin(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize_origin("   "), Err(UrlError::Empty)));
        assert!(matches!(canonicalize_origin("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_rebase_keeps_query() {
        let origin = canonicalize_origin("https://herbs.example").unwrap();
        let url = rebase(&origin, "/plants/tulsi?view=3d").unwrap();
        assert_eq!(url.as_str(), "https://herbs.example/plants/tulsi?view=3d");
    }

    #[test]
    fn test_rebase_stays_on_origin() {
        let origin = canonicalize_origin("https://herbs.example").unwrap();
        let url = rebase(&origin, "//evil.test/steal").unwrap();
        assert_eq!(url.host_str(), Some("herbs.example"));
    }

    #[test]
    fn test_rebase_rejects_relative() {
        let origin = canonicalize_origin("https://herbs.example").unwrap();
        assert!(rebase(&origin, "plants").is_err());
    }
}
