use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::Error;
use crate::utils::token::decode_access_token;

/// Caller's bearer token, forwarded as-is to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerError {
    Missing,
    Malformed,
    UnsupportedScheme,
}

impl BearerError {
    pub fn code(&self) -> &'static str {
        match self {
            BearerError::Missing => "missing_authorization",
            BearerError::Malformed => "bad_authorization",
            BearerError::UnsupportedScheme => "unsupported_scheme",
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers.get(AUTHORIZATION).ok_or(BearerError::Missing)?;
    let value = value.to_str().map_err(|_| BearerError::Malformed)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(BearerError::UnsupportedScheme)?
        .trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .map_err(|e| Error::Unauthorized(e.code().to_string()))?;
        Ok(Self {
            token: token.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

/// Verifies demo-issued tokens and stores the claims in request extensions.
pub async fn require_bearer_auth(
    State(secret): State<JwtSecret>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": e.code() }))).into_response()
        }
    };

    match decode_access_token(&token, &secret.0) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "invalid_token" })),
        )
            .into_response(),
    }
}
