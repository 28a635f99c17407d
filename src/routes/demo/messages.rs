use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;

use crate::{
    dto::message_dto::{MessageList, MessageQuery},
    error::{Error, Result},
    models::message::{ChatMessage, CreateChatMessage},
    routes::demo::DemoState,
};

pub async fn list_messages(
    State(state): State<DemoState>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let application_id = query
        .application_id
        .ok_or_else(|| Error::BadRequest("application_id is required".to_string()))?;
    let mut messages: Vec<ChatMessage> = state
        .store
        .messages
        .list()
        .await?
        .into_iter()
        .filter(|m| m.application_id == application_id)
        .collect();
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(Json(MessageList { messages }))
}

pub async fn create_message(
    State(state): State<DemoState>,
    Json(payload): Json<CreateChatMessage>,
) -> Result<impl IntoResponse> {
    state.application(payload.application_id).await?;
    if payload.content.trim().is_empty() {
        return Err(Error::BadRequest("Message content must not be empty".to_string()));
    }
    let message = state
        .store
        .messages
        .create(ChatMessage {
            id: 0,
            application_id: payload.application_id,
            sender_type: payload.sender_type,
            content: payload.content,
            created_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
