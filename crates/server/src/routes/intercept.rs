//! Every request outside the control prefix goes through the proxy.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use herbcache_client::rebase;
use herbcache_core::{Error, RequestRecord, ResponseRecord};

use super::AppState;
use crate::error::HttpError;

pub async fn intercept(
    State(state): State<AppState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes,
) -> Result<Response, HttpError> {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = rebase(state.proxy.origin(), target).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let headers = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    let response = state
        .proxy
        .on_intercept(RequestRecord::from_http(method, url, headers, body))
        .await?;
    Ok(into_http(response))
}

fn into_http(record: ResponseRecord) -> Response {
    let status = StatusCode::from_u16(record.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Body::from(record.body)).into_response();
    let headers = response.headers_mut();
    for (name, value) in &record.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(header = name.as_str(), "dropping unrepresentable header"),
        }
    }
    response
}
