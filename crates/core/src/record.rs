//! Request and response records flowing through the proxy.
//!
//! A [`RequestRecord`] carries exactly what the classifier needs (method,
//! absolute URL, navigation flag, destination hint) plus enough of the
//! original request to forward it. A [`ResponseRecord`] is stored and replayed
//! verbatim; the proxy never looks inside the body.

use bytes::Bytes;
use http::Method;
use url::Url;

/// Destination hint supplied by the host, in `Sec-Fetch-Dest` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    #[default]
    Other,
}

impl Destination {
    /// Parse a `Sec-Fetch-Dest` value. Unknown values map to [`Destination::Other`].
    pub fn from_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            _ => Destination::Other,
        }
    }
}

/// One intercepted request.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub method: Method,
    pub url: Url,
    /// Top-level document load.
    pub navigation: bool,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RequestRecord {
    /// A plain GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            navigation: false,
            destination: Destination::Other,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// A top-level navigation.
    pub fn navigate(url: Url) -> Self {
        Self { navigation: true, destination: Destination::Document, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build a record from raw HTTP parts, deriving the navigation flag and
    /// destination from fetch metadata headers.
    ///
    /// Without `Sec-Fetch-Mode`, a GET that accepts `text/html` counts as a
    /// navigation.
    pub fn from_http(method: Method, url: Url, headers: Vec<(String, String)>, body: Bytes) -> Self {
        let header = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        let destination = header("sec-fetch-dest")
            .map(Destination::from_fetch_dest)
            .unwrap_or_default();

        let navigation = match header("sec-fetch-mode") {
            Some(mode) => mode.trim().eq_ignore_ascii_case("navigate"),
            None => method == Method::GET && header("accept").is_some_and(|accept| accept.contains("text/html")),
        };

        let destination =
            if navigation && destination == Destination::Other { Destination::Document } else { destination };

        Self { method, url, navigation, destination, headers, body }
    }

    /// First value of a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as stored in, and replayed from, a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Final URL the response was served from.
    pub url: String,
}

impl ResponseRecord {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), url: url.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only 2xx responses are written to a partition.
    pub fn is_cacheable(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_destination_parsing() {
        assert_eq!(Destination::from_fetch_dest("script"), Destination::Script);
        assert_eq!(Destination::from_fetch_dest("Style"), Destination::Style);
        assert_eq!(Destination::from_fetch_dest("image"), Destination::Image);
        assert_eq!(Destination::from_fetch_dest("font"), Destination::Other);
        assert_eq!(Destination::from_fetch_dest(""), Destination::Other);
    }

    #[test]
    fn test_from_http_fetch_metadata() {
        let record = RequestRecord::from_http(
            Method::GET,
            url("https://herbs.example/static/js/main.js"),
            headers(&[("Sec-Fetch-Mode", "no-cors"), ("Sec-Fetch-Dest", "script")]),
            Bytes::new(),
        );
        assert!(!record.navigation);
        assert_eq!(record.destination, Destination::Script);
    }

    #[test]
    fn test_from_http_navigation() {
        let record = RequestRecord::from_http(
            Method::GET,
            url("https://herbs.example/plants/tulsi"),
            headers(&[("sec-fetch-mode", "navigate"), ("sec-fetch-dest", "document")]),
            Bytes::new(),
        );
        assert!(record.navigation);
        assert_eq!(record.destination, Destination::Document);
    }

    #[test]
    fn test_from_http_accept_heuristic() {
        let record = RequestRecord::from_http(
            Method::GET,
            url("https://herbs.example/"),
            headers(&[("accept", "text/html,application/xhtml+xml")]),
            Bytes::new(),
        );
        assert!(record.navigation);

        let post = RequestRecord::from_http(
            Method::POST,
            url("https://herbs.example/feedback"),
            headers(&[("accept", "text/html")]),
            Bytes::from_static(b"name=x"),
        );
        assert!(!post.navigation);
    }

    #[test]
    fn test_cacheable_statuses() {
        assert!(ResponseRecord::new(200, "u", "x").is_cacheable());
        assert!(ResponseRecord::new(204, "u", "").is_cacheable());
        assert!(!ResponseRecord::new(304, "u", "").is_cacheable());
        assert!(!ResponseRecord::new(404, "u", "").is_cacheable());
        assert!(!ResponseRecord::new(503, "u", "").is_cacheable());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ResponseRecord::new(200, "u", "x").with_header("Content-Type", "model/gltf-binary");
        assert_eq!(response.header("content-type"), Some("model/gltf-binary"));
    }
}
