use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::{
    dto::message_dto::{EmployerMessageList, SendEmployerMessage, SenderQuery},
    error::{Error, Result},
    models::{message::ThreadSender, user::UserRole},
    routes::demo::{applications::post_thread_message, DemoState},
    services::employer_chat_service::normalize_content,
};

pub async fn list_messages(
    State(state): State<DemoState>,
    Path(application_id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.application(application_id).await?;
    let mut messages: Vec<_> = state
        .store
        .employer_messages
        .list()
        .await?
        .into_iter()
        .filter(|m| m.application_id == application_id)
        .collect();
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(Json(EmployerMessageList { messages }))
}

pub async fn send_message(
    State(state): State<DemoState>,
    Path(application_id): Path<i64>,
    Query(sender): Query<SenderQuery>,
    Json(payload): Json<SendEmployerMessage>,
) -> Result<impl IntoResponse> {
    state.application(application_id).await?;
    let content = normalize_content(&payload.content)?;
    let sender_id = sender
        .sender_user_id
        .ok_or_else(|| Error::BadRequest("sender_user_id is required".to_string()))?;
    let account = state
        .store
        .accounts
        .get(sender_id)
        .await?
        .ok_or_else(|| Error::NotFound("Sender not found".to_string()))?;

    let sender_type = match account.user.role {
        UserRole::Employer => ThreadSender::Employer,
        UserRole::JobSeeker => ThreadSender::JobSeeker,
    };
    let message = post_thread_message(
        &state,
        application_id,
        sender_type,
        account.user.id,
        Some(account.user.full_name),
        &content,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(state): State<DemoState>,
    Path((application_id, message_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let mut message = state
        .store
        .employer_messages
        .get(message_id)
        .await?
        .filter(|m| m.application_id == application_id)
        .ok_or_else(|| Error::NotFound("Message not found".to_string()))?;
    message.is_read = true;
    state.store.employer_messages.update(message).await?;
    Ok(Json(json!({ "message": "Message marked as read" })))
}
