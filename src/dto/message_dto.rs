use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::message::{ChatMessage, EmployerMessage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployerMessageList {
    #[serde(default)]
    pub messages: Vec<EmployerMessage>,
}

/// Thread as shown to one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThreadView {
    pub messages: Vec<EmployerMessage>,
    /// Messages from the other side the viewer has not read yet.
    pub unread: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendEmployerMessage {
    pub application_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageQuery {
    pub application_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SenderQuery {
    pub sender_user_id: Option<i64>,
}

/// Body accepted by the portal's thread endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ThreadMessagePayload {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}
