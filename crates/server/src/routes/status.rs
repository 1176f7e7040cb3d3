use axum::Json;
use axum::extract::State;
use herbcache_core::ProxyStatus;

use super::AppState;
use crate::error::HttpError;

pub async fn status(State(state): State<AppState>) -> Result<Json<ProxyStatus>, HttpError> {
    Ok(Json(state.proxy.status().await?))
}
