mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use common::{call, portal};

const SEEKER_ID: i64 = 5;
const VACANCY_ID: i64 = 11;

/// Backend whose analysis endpoint fails once and then recovers.
async fn spawn_flaky_backend(analyze_calls: Arc<AtomicUsize>) -> String {
    async fn me() -> impl IntoResponse {
        Json(json!({
            "id": SEEKER_ID,
            "email": "seeker@example.com",
            "full_name": "Flaky Seeker",
            "role": "job_seeker",
            "is_active": true
        }))
    }

    async fn application(Path(id): Path<i64>) -> impl IntoResponse {
        Json(json!({
            "id": id,
            "status": "pending",
            "created_at": "2026-01-05T10:00:00Z",
            "job_seeker_id": SEEKER_ID,
            "vacancy_id": VACANCY_ID
        }))
    }

    async fn analyze(State(calls): State<Arc<AtomicUsize>>) -> impl IntoResponse {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "detail": "model is warming up" })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "session_id": "s-1",
                "relevance_percent": 40.0,
                "bot_reply": "Hello",
                "dialog_stage": "questioning",
                "is_completed": false
            })),
        )
    }

    let router = Router::new()
        .route("/auth/me", get(me))
        .route("/applications/:id", get(application))
        .route("/applications/:id/analyze", post(analyze))
        .with_state(analyze_calls);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub backend");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn start_is_retried_after_the_analysis_failed() {
    let analyze_calls = Arc::new(AtomicUsize::new(0));
    let backend = spawn_flaky_backend(analyze_calls.clone()).await;
    let app = portal(&backend);
    let token = Some("stub-token");

    let (status, first) = call(&app, "POST", "/api/interviews/3/start", token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["phase"], "not_started");
    assert!(first["session_id"].is_null());
    let transcript = first["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0]["role"], "assistant");

    let (status, second) = call(&app, "POST", "/api/interviews/3/start", token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["phase"], "in_progress");
    assert_eq!(second["session_id"], "s-1");
    // The fallback line stays, followed by the greeting.
    assert_eq!(second["transcript"].as_array().unwrap().len(), 2);
    assert_eq!(second["transcript"][1]["text"], "Hello");

    // A third start is a no-op on the running interview.
    let (status, third) = call(&app, "POST", "/api/interviews/3/start", token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["session_id"], "s-1");
    assert_eq!(analyze_calls.load(Ordering::SeqCst), 2);
}
