mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use common::{apply, client, portal, seeker, spawn_demo_backend};

const BOUNDARY: &str = "resume-boundary";

async fn upload(app: &Router, application_id: i64, token: &str, file_name: &str, data: &[u8]) -> (StatusCode, JsonValue) {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        b = BOUNDARY,
        f = file_name
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/applications/{}/resume", application_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
}

#[tokio::test]
async fn oversized_resume_is_rejected_before_reaching_the_backend() {
    // Nothing listens here; any outbound call would surface as 502.
    let app = portal("http://127.0.0.1:1");
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(11 * 1024 * 1024, b'a');

    let (status, body) = upload(&app, 1, "any-token", "cv.pdf", &data).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unsupported_files_are_rejected_locally() {
    let app = portal("http://127.0.0.1:1");

    let (status, _) = upload(&app, 1, "any-token", "cv.exe", b"MZ\x90\x00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(&app, 1, "any-token", "cv.pdf", b"not really a pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn text_resume_is_stored_on_the_application() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "See attached resume.").await;

    let (status, receipt) = upload(
        &app,
        application.id,
        &seeker.token,
        "cv.txt",
        b"Five years of React, TypeScript and Next.js.",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", receipt);
    assert_eq!(receipt["filename"], "cv.txt");

    let stored = client(&backend)
        .get_application(application.id)
        .await
        .unwrap();
    assert_eq!(stored.resume_filename.as_deref(), Some("cv.txt"));
}
