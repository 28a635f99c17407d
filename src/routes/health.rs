use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "demo_backend": state.config.demo_backend,
        "open_interviews": state.interviews.len(),
    });
    (StatusCode::OK, Json(body))
}
