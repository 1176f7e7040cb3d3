//! HTTP upstream for the proxy.
//!
//! ### Forwarding
//! - Method, URL, body and end-to-end headers are sent as received
//! - Hop-by-hop headers are dropped both ways
//! - Redirects are followed (max 5); the record keeps the final URL
//!
//! ### Limits
//! - Request timeout from config; expiry surfaces as a network error
//! - Max body bytes (configurable), checked against `Content-Length` and
//!   again after reading
//!
//! HTTP error statuses are returned as responses, not errors.

pub mod headers;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use herbcache_core::{AppConfig, Error, RequestRecord, ResponseRecord, Upstream};

use self::headers::{forward_request_header, keep_response_header};

/// Configuration for the HTTP upstream.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// User agent string (default: "herbcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 64MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "herbcache/0.1".to_string(),
            max_bytes: 64 * 1024 * 1024,
            timeout: Duration::from_millis(30_000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for UpstreamConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Self::default()
        }
    }
}

/// reqwest-backed [`Upstream`].
pub struct HttpUpstream {
    http: Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    /// Create a new upstream with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &RequestRecord) -> Result<ResponseRecord, Error> {
        let start = Instant::now();

        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        for (name, value) in request.headers.iter().filter(|(name, _)| forward_request_header(name)) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timed out: {}", request.url))
            } else {
                Error::Network(format!("network error: {}", e))
            }
        })?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let status = response.status();
        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| keep_response_header(name.as_str()))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            fetch_ms,
            body.len()
        );

        Ok(ResponseRecord { status: status.as_u16(), headers, body, url: final_url })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP/1.1 response and return the request head it received.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn request(url: &str) -> RequestRecord {
        RequestRecord::get(::url::Url::parse(url).unwrap())
    }

    #[test]
    fn test_upstream_config_default() {
        let config = UpstreamConfig::default();
        assert_eq!(config.user_agent, "herbcache/0.1");
        assert_eq!(config.max_bytes, 64 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_upstream_config_from_app_config() {
        let app = AppConfig {
            user_agent: "herbcache-test".into(),
            max_bytes: 1024,
            timeout_ms: 500,
            ..AppConfig::default()
        };
        let config = UpstreamConfig::from(&app);
        assert_eq!(config.user_agent, "herbcache-test");
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_fetch_returns_status_headers_and_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 6\r\nConnection: close\r\n\r\nbody{}",
        )
        .await;
        let upstream = HttpUpstream::new(UpstreamConfig::default()).unwrap();
        let record = request(&format!("{base}/static/css/main.css"))
            .with_header("Accept", "text/css")
            .with_header("Connection", "keep-alive");

        let response = upstream.fetch(&record).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"body{}");
        assert_eq!(response.header("content-type"), Some("text/css"));
        assert_eq!(response.header("content-length"), None);
        assert_eq!(response.header("connection"), None);

        let head = server.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /static/css/main.css"));
        assert!(head.contains("accept: text/css"));
        assert!(head.contains("user-agent: herbcache/0.1"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_a_response() {
        let (base, _server) =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope").await;
        let upstream = HttpUpstream::new(UpstreamConfig::default()).unwrap();

        let response = upstream.fetch(&request(&format!("{base}/missing"))).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_cacheable());
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let (base, _server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789").await;
        let upstream = HttpUpstream::new(UpstreamConfig { max_bytes: 4, ..UpstreamConfig::default() }).unwrap();

        let err = upstream.fetch(&request(&format!("{base}/models/tulsi.glb"))).await.unwrap_err();
        assert!(matches!(err, Error::FetchTooLarge(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let upstream = HttpUpstream::new(UpstreamConfig::default()).unwrap();

        let err = upstream.fetch(&request(&format!("http://{addr}/"))).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.code(), "NETWORK_ERROR");
    }
}
