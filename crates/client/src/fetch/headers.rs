//! Header filtering between the browser, the proxy and the origin.

/// Connection-scoped headers that never cross a proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers reqwest sets itself on the outgoing request.
const REQUEST_MANAGED: &[&str] = &["host", "content-length", "accept-encoding"];

/// Headers describing the wire body, which is decoded before storage.
const RESPONSE_MANAGED: &[&str] = &["content-length", "content-encoding"];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Whether a browser request header is forwarded to the origin.
pub fn forward_request_header(name: &str) -> bool {
    !is_hop_by_hop(name) && !REQUEST_MANAGED.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Whether an origin response header is kept in the response record.
pub fn keep_response_header(name: &str) -> bool {
    !is_hop_by_hop(name) && !RESPONSE_MANAGED.iter().any(|h| name.eq_ignore_ascii_case(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_headers() {
        assert!(forward_request_header("Accept"));
        assert!(forward_request_header("sec-fetch-dest"));
        assert!(!forward_request_header("Host"));
        assert!(!forward_request_header("Connection"));
        assert!(!forward_request_header("Accept-Encoding"));
    }

    #[test]
    fn test_response_headers() {
        assert!(keep_response_header("Content-Type"));
        assert!(keep_response_header("cache-control"));
        assert!(!keep_response_header("Transfer-Encoding"));
        assert!(!keep_response_header("Content-Encoding"));
        assert!(!keep_response_header("content-length"));
    }
}
