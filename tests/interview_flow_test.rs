mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{apply, call, portal, register_seeker, seeker, spawn_demo_backend};

#[tokio::test]
async fn interview_runs_to_completion_and_locks_input() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Five years of React and TypeScript.").await;
    let token = Some(seeker.token.as_str());
    let base = format!("/api/interviews/{}", application.id);

    let start_body = json!({});
    let (status, first) = call(&app, "POST", &format!("{}/start", base), token, Some(start_body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["phase"], "in_progress");
    assert_eq!(first["transcript"].as_array().unwrap().len(), 1);
    assert_eq!(first["transcript"][0]["role"], "assistant");
    let session_id = first["session_id"].clone();
    assert!(session_id.is_string());

    // A second start neither re-analyzes nor duplicates the greeting.
    let (status, again) = call(&app, "POST", &format!("{}/start", base), token, Some(start_body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["session_id"], session_id);
    assert_eq!(again["transcript"].as_array().unwrap().len(), 1);

    let answers = [
        "I have built React and TypeScript frontends for five years.",
        "React daily, TypeScript for four years, Next.js for two.",
        "I led the migration of our dashboard to Next.js.",
        "Remote work and a market salary.",
        "I can start in two weeks.",
    ];
    let mut last = again;
    for answer in answers {
        let (status, snapshot) = call(
            &app,
            "POST",
            &format!("{}/turn", base),
            token,
            Some(json!({ "message": answer })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "turn failed: {}", snapshot);
        last = snapshot;
    }
    assert_eq!(last["phase"], "completed");
    assert_eq!(last["is_completed"], true);
    assert_eq!(last["turn_count"], 5);
    // Greeting plus one question-answer pair per turn.
    assert_eq!(last["transcript"].as_array().unwrap().len(), 11);

    let (status, _) = call(
        &app,
        "POST",
        &format!("{}/turn", base),
        token,
        Some(json!({ "message": "One more thing" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, snapshot) = call(&app, "GET", &base, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "completed");
    assert_eq!(snapshot["transcript"], last["transcript"]);
}

#[tokio::test]
async fn turn_without_open_interview_is_not_found() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let seeker = seeker(&backend).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/interviews/999/turn",
        Some(&seeker.token),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn interview_routes_require_a_bearer_token() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);

    let (status, _) = call(
        &app,
        "POST",
        "/api/interviews/1/start",
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/interviews/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn another_seeker_cannot_touch_the_interview() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let owner = seeker(&backend).await;
    let application = apply(&backend, &owner, "Five years of React.").await;
    let base = format!("/api/interviews/{}", application.id);

    let (status, _) = call(&app, "POST", &format!("{}/start", base), Some(&owner.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let intruder = register_seeker(&backend, "intruder@example.com").await;
    let token = Some(intruder.token.as_str());

    let (status, _) = call(&app, "POST", &format!("{}/start", base), token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "POST",
        &format!("{}/turn", base),
        token,
        Some(json!({ "message": "Let me answer instead" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "GET", &base, token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner's transcript is untouched.
    let (status, snapshot) = call(&app, "GET", &base, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["transcript"].as_array().unwrap().len(), 1);
}
