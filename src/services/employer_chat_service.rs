use crate::dto::message_dto::ThreadView;
use crate::error::{Error, Result};
use crate::models::message::EmployerMessage;
use crate::services::backend_client::BackendClient;

pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Clone)]
pub struct EmployerChatService {
    client: BackendClient,
}

impl EmployerChatService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Thread in chronological order.
    pub async fn thread(&self, application_id: i64) -> Result<Vec<EmployerMessage>> {
        let mut messages = self.client.employer_thread(application_id).await?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    /// Thread plus the viewer's unread count.
    pub async fn view(&self, application_id: i64, viewer_id: i64) -> Result<ThreadView> {
        let messages = self.thread(application_id).await?;
        Ok(ThreadView {
            unread: unread_count(&messages, viewer_id),
            messages,
        })
    }

    pub async fn send(
        &self,
        application_id: i64,
        sender_user_id: i64,
        content: &str,
    ) -> Result<EmployerMessage> {
        let content = normalize_content(content)?;
        let message = self
            .client
            .send_employer_message(application_id, &content, sender_user_id)
            .await?;
        tracing::info!(application_id, message_id = message.id, "Employer chat message sent");
        Ok(message)
    }

    pub async fn mark_read(&self, application_id: i64, message_id: i64) -> Result<()> {
        self.client.mark_message_read(application_id, message_id).await
    }
}

pub fn normalize_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest("Message content must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(Error::BadRequest(format!(
            "Message content must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// Messages the viewer has not read yet, excluding their own.
pub fn unread_count(messages: &[EmployerMessage], viewer_id: i64) -> usize {
    messages
        .iter()
        .filter(|m| !m.is_read && m.sender_id != viewer_id)
        .count()
}
