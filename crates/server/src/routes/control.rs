//! Foreground → proxy messages.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use herbcache_core::ControlMessage;

use super::AppState;

/// Accepts `{"type": "SKIP_WAITING"}`. Unknown types are accepted and ignored.
pub async fn message(State(state): State<AppState>, Json(message): Json<ControlMessage>) -> StatusCode {
    state.proxy.on_control_message(message);
    StatusCode::ACCEPTED
}
