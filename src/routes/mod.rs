pub mod demo;
pub mod employer_chat;
pub mod health;
pub mod interview;
pub mod openapi;
pub mod proxy;
pub mod resume;
pub mod review;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, patch, post},
    Router,
};

use crate::middleware::in_flight::reject_duplicate_mutations;
use crate::routes::demo::upload_body_limit;
use crate::AppState;

/// Every route the portal serves itself, without the demo backend.
pub fn portal_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/interviews/:application_id/start",
            post(interview::start_interview),
        )
        .route(
            "/api/interviews/:application_id/turn",
            post(interview::submit_turn),
        )
        .route(
            "/api/interviews/:application_id",
            get(interview::get_interview),
        )
        .route(
            "/api/vacancies/:id/candidates",
            get(review::list_candidates),
        )
        .route("/api/applications/:id/action", post(review::apply_action))
        .route("/api/my/applications", get(review::my_applications))
        .route(
            "/api/applications/:id/thread",
            get(employer_chat::get_thread).post(employer_chat::post_message),
        )
        .route(
            "/api/applications/:id/thread/:message_id/read",
            patch(employer_chat::mark_read),
        )
        .route(
            "/api/applications/:id/resume",
            post(resume::upload_resume).layer(DefaultBodyLimit::max(upload_body_limit(
                state.config.max_resume_bytes,
            ))),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.in_flight.clone(),
            reject_duplicate_mutations,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .route("/api/proxy/*path", any(proxy::forward))
        .merge(api)
        .with_state(state)
}
