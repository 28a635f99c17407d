use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::message_dto::ThreadMessagePayload,
    error::Result,
    middleware::auth::AuthContext,
    services::employer_chat_service::EmployerChatService,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/applications/{id}/thread",
    params(("id" = i64, Path, description = "Application ID")),
    responses((status = 200, description = "Thread in chronological order with the caller's unread count", body = ThreadView))
)]
#[axum::debug_handler]
pub async fn get_thread(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let client = state.backend(&auth);
    let viewer = client.current_user().await?;
    let view = EmployerChatService::new(client)
        .view(application_id, viewer.id)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/thread",
    params(("id" = i64, Path, description = "Application ID")),
    request_body = ThreadMessagePayload,
    responses(
        (status = 201, description = "Message stored", body = EmployerMessage),
        (status = 400, description = "Empty or oversized content")
    )
)]
#[axum::debug_handler]
pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
    Json(payload): Json<ThreadMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let client = state.backend(&auth);
    let sender = client.current_user().await?;
    let message = EmployerChatService::new(client)
        .send(application_id, sender.id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/thread/{message_id}/read",
    params(
        ("id" = i64, Path, description = "Application ID"),
        ("message_id" = i64, Path, description = "Message ID")
    ),
    responses((status = 204, description = "Marked as read"))
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((application_id, message_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    EmployerChatService::new(state.backend(&auth))
        .mark_read(application_id, message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
