use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Tracks mutations currently being served, keyed by caller, method and path.
#[derive(Clone, Debug, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

struct Claim {
    guard: InFlightGuard,
    key: String,
}

impl Drop for Claim {
    fn drop(&mut self) {
        if let Ok(mut keys) = self.guard.keys.lock() {
            keys.remove(&self.key);
        }
    }
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self, key: String) -> Option<Claim> {
        let mut keys = self.keys.lock().ok()?;
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(Claim {
            guard: self.clone(),
            key,
        })
    }

    pub fn active(&self) -> usize {
        self.keys.lock().map(|k| k.len()).unwrap_or(0)
    }
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

pub async fn reject_duplicate_mutations(
    State(guard): State<InFlightGuard>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutation(req.method()) {
        return next.run(req).await;
    }

    let caller = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    let key = format!("{} {} {}", caller, req.method(), req.uri().path());

    // Held until the response is produced, then released by Drop.
    let Some(_claim) = guard.claim(key) else {
        tracing::warn!(path = %req.uri().path(), "Rejected duplicate in-flight request");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "request_in_progress" })),
        )
            .into_response();
    };
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exclusive_until_dropped() {
        let guard = InFlightGuard::new();
        let first = guard.claim("t POST /a".to_string());
        assert!(first.is_some());
        assert!(guard.claim("t POST /a".to_string()).is_none());
        assert!(guard.claim("t POST /b".to_string()).is_some());
        drop(first);
        assert!(guard.claim("t POST /a".to_string()).is_some());
        assert_eq!(guard.active(), 0);
    }
}
