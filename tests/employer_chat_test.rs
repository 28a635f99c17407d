mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{apply, call, employer, portal, seeker, spawn_demo_backend};

#[tokio::test]
async fn both_parties_exchange_messages_in_order() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let employer = employer(&backend).await;
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Keen to join.").await;
    let thread = format!("/api/applications/{}/thread", application.id);

    let (status, first) = call(
        &app,
        "POST",
        &thread,
        Some(&employer.token),
        Some(json!({ "content": "  When can we talk?  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);
    assert_eq!(first["sender_type"], "employer");
    assert_eq!(first["content"], "When can we talk?");

    let (status, reply) = call(
        &app,
        "POST",
        &thread,
        Some(&seeker.token),
        Some(json!({ "content": "Tomorrow works." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["sender_type"], "job_seeker");
    assert_eq!(reply["sender_id"], seeker.user.id);

    let (status, listing) = call(&app, "GET", &thread, Some(&seeker.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = listing["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "When can we talk?");
    assert_eq!(messages[1]["content"], "Tomorrow works.");
    // Only the employer's line is unread for the seeker.
    assert_eq!(listing["unread"], 1);

    let (_, employer_view) = call(&app, "GET", &thread, Some(&employer.token), None).await;
    assert_eq!(employer_view["unread"], 1);

    let (status, _) = call(
        &app,
        "PATCH",
        &format!("{}/{}/read", thread, first["id"]),
        Some(&seeker.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, listing) = call(&app, "GET", &thread, Some(&seeker.token), None).await;
    assert_eq!(listing["messages"][0]["is_read"], true);
    assert_eq!(listing["unread"], 0);
}

#[tokio::test]
async fn blank_messages_are_rejected() {
    let backend = spawn_demo_backend().await;
    let app = portal(&backend);
    let seeker = seeker(&backend).await;
    let application = apply(&backend, &seeker, "Keen to join.").await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/thread", application.id),
        Some(&seeker.token),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
