//! Model warm-up requested by the application.

use axum::Json;
use axum::extract::State;
use herbcache_core::PreloadReport;
use serde::Deserialize;

use super::AppState;
use crate::error::HttpError;

#[derive(Debug, Deserialize)]
pub struct PreloadRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

pub async fn preload(
    State(state): State<AppState>, Json(request): Json<PreloadRequest>,
) -> Result<Json<PreloadReport>, HttpError> {
    Ok(Json(state.proxy.preload_models(&request.paths).await?))
}
