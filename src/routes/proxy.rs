use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value as JsonValue};

use crate::AppState;

const FORWARDED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

#[derive(Debug, thiserror::Error)]
enum ProxyError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid JSON from backend: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unsupported method {0}")]
    Method(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Proxy request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to proxy request",
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Forwards `/api/proxy/<path>` to `<BACKEND_URL>/<path>` and relays the backend's answer unchanged.
#[utoipa::path(
    get,
    path = "/api/proxy/{path}",
    params(("path" = String, Path, description = "Backend path to forward to")),
    responses(
        (status = 200, description = "Backend response, relayed with its original status"),
        (status = 500, description = "Transport or decode failure")
    )
)]
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match forward_inner(&state, &path, method, query, &headers, body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn forward_inner(
    state: &AppState,
    path: &str,
    method: Method,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    if !FORWARDED_METHODS.contains(&method) {
        return Err(ProxyError::Method(method.to_string()));
    }
    let outbound_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|_| ProxyError::Method(method.to_string()))?;

    let mut url = format!(
        "{}/{}",
        state.config.backend_url,
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&query);
    }
    tracing::debug!(%method, %url, "Proxying request");

    let mut request = state
        .http_client
        .request(outbound_method, &url)
        .timeout(Duration::from_secs(state.config.proxy_timeout_secs));
    for name in [header::CONTENT_TYPE, header::AUTHORIZATION] {
        if let Some(value) = headers.get(&name).and_then(|v| v.to_str().ok()) {
            request = request.header(name.as_str(), value);
        }
    }
    if method != Method::GET && !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await?;
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let bytes = upstream.bytes().await?;

    if bytes.is_empty() {
        return Ok((status, Body::empty()).into_response());
    }
    let payload: JsonValue = serde_json::from_slice(&bytes)?;
    Ok((status, Json(payload)).into_response())
}
