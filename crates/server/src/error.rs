//! Mapping proxy errors onto HTTP responses.
//!
//! The stable error code travels in `x-herbcache-error` so a client can tell
//! "offline and nothing cached" from a storage fault.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use herbcache_core::Error;

pub const ERROR_HEADER: &str = "x-herbcache-error";

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HttpError(#[from] pub Error);

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::CacheMiss(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Network(_) | Error::FetchTooLarge(_) => StatusCode::BAD_GATEWAY,
            Error::Lifecycle(_) => StatusCode::CONFLICT,
            Error::InstallFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.0.code(), error = %self.0, "request failed");
        }
        let mut response = (status, self.0.to_string()).into_response();
        response
            .headers_mut()
            .insert(ERROR_HEADER, HeaderValue::from_static(self.0.code()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Network("down".into()), StatusCode::BAD_GATEWAY),
            (Error::FetchTooLarge("big".into()), StatusCode::BAD_GATEWAY),
            (Error::CacheMiss("gone".into()), StatusCode::GATEWAY_TIMEOUT),
            (Error::InvalidUrl("bad".into()), StatusCode::BAD_REQUEST),
            (Error::CorruptEntry("junk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Lifecycle("early".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError(err).status(), status);
        }
    }

    #[test]
    fn test_error_header() {
        let response = HttpError(Error::CacheMiss("nothing cached".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.headers()[ERROR_HEADER], "CACHE_MISS");
    }
}
