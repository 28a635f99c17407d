mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{apply, call, employer, portal, seeker, spawn_demo_backend};

#[tokio::test]
async fn candidates_page_filters_and_counts() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let employer = employer(&backend).await;
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Keen to join.").await;
    let uri = format!("/api/vacancies/{}/candidates", application.vacancy_id);

    let (status, overview) = call(&app, "GET", &uri, Some(&employer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["vacancy"]["id"], application.vacancy_id);
    assert_eq!(overview["counts"]["all"], 1);
    assert_eq!(overview["counts"]["pending"], 1);
    assert_eq!(overview["buckets"]["low"], 1);
    assert_eq!(overview["candidates"].as_array().unwrap().len(), 1);

    let (status, accepted_tab) = call(
        &app,
        "GET",
        &format!("{}?status=accepted", uri),
        Some(&employer.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(accepted_tab["candidates"].as_array().unwrap().is_empty());
    // Tab counts are computed before filtering.
    assert_eq!(accepted_tab["counts"]["all"], 1);

    let (status, _) = call(
        &app,
        "GET",
        &format!("{}?relevance=excellent", uri),
        Some(&employer.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn accepting_opens_the_thread_and_repeat_decisions_are_ignored() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let employer = employer(&backend).await;
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Keen to join.").await;
    let uri = format!("/api/applications/{}/action", application.id);

    let (status, outcome) = call(
        &app,
        "POST",
        &uri,
        Some(&employer.token),
        Some(json!({ "action": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", outcome);
    assert_eq!(outcome["status"], "accepted");
    assert_eq!(outcome["changed"], true);
    let thread = outcome["thread"].as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["sender_type"], "system");

    let (status, repeat) = call(
        &app,
        "POST",
        &uri,
        Some(&employer.token),
        Some(json!({ "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repeat["status"], "accepted");
    assert_eq!(repeat["changed"], false);

    let (status, mine) = call(&app, "GET", "/api/my/applications", Some(&seeker.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["counts"]["accepted"], 1);
    assert_eq!(mine["applications"][0]["message_count"], 1);

    let (status, _) = call(&app, "GET", "/api/my/applications", Some(&employer.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn seeker_cannot_decide_on_applications() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Keen to join.").await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/action", application.id),
        Some(&seeker.token),
        Some(json!({ "action": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
