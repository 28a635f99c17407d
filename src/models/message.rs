use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Author of a message in the screening-bot transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    Bot,
    #[serde(alias = "job_seeker")]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: i64,
    pub application_id: i64,
    pub sender_type: ChatSender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateChatMessage {
    pub application_id: i64,
    pub sender_type: ChatSender,
    pub content: String,
}

/// Author of a message in the employer-candidate thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSender {
    Employer,
    JobSeeker,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployerMessage {
    pub id: i64,
    pub application_id: i64,
    pub sender_type: ThreadSender,
    pub sender_id: i64,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}
