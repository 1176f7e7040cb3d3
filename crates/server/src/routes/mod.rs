//! HTTP surface of the proxy.
//!
//! Paths under [`CONTROL_PREFIX`] talk to the proxy itself; everything else
//! is an intercepted request for the origin.

mod control;
mod intercept;
mod preload;
mod status;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use herbcache_core::Proxy;

pub const CONTROL_PREFIX: &str = "/__herbcache";

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<Proxy>,
}

pub fn router(proxy: Arc<Proxy>, max_body: usize) -> Router {
    Router::new()
        .route(&format!("{CONTROL_PREFIX}/status"), get(status::status))
        .route(&format!("{CONTROL_PREFIX}/message"), post(control::message))
        .route(&format!("{CONTROL_PREFIX}/preload"), post(preload::preload))
        .fallback(intercept::intercept)
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(AppState { proxy })
}
