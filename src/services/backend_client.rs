use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::{Config, DEFAULT_MAX_RESUME_BYTES};
use crate::dto::analysis_dto::{AnalysisReply, AnalyzeRequest, ChatTurnRequest};
use crate::dto::application_dto::{
    ActionReceipt, ActionRequest, ApplicationList, ApplicationPatch, ApplicationQuery,
    NewApplication, ReviewAction, UploadReceipt,
};
use crate::dto::auth_dto::{LoginPayload, LoginResponse, RegisterPayload};
use crate::dto::message_dto::{EmployerMessageList, MessageList, SendEmployerMessage};
use crate::dto::vacancy_dto::{VacancyDraft, VacancyPage, VacancyPatch, VacancyQuery};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::message::{ChatMessage, ChatSender, CreateChatMessage, EmployerMessage};
use crate::models::user::User;
use crate::models::vacancy::Vacancy;
use crate::services::interview_service::ScreeningBackend;
use crate::utils::validation::check_resume_size;

/// Typed client for the recruitment backend's REST surface.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    upload_url: String,
    token: Option<String>,
    max_resume_bytes: u64,
}

impl BackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            upload_url: base_url.clone(),
            base_url,
            token: None,
            max_resume_bytes: DEFAULT_MAX_RESUME_BYTES,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(client, config.backend_url.clone())
            .with_upload_url(config.backend_upload_url.clone())
            .with_max_resume_bytes(config.max_resume_bytes)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = upload_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_resume_bytes(mut self, limit: u64) -> Self {
        self.max_resume_bytes = limit;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let response = Self::ensure_success(response, what).await?;
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = upstream_message(&body).unwrap_or_else(|| format!("Failed to {}", what));
        tracing::warn!(status = status.as_u16(), %message, "Backend call failed: {}", what);
        Err(Error::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self.authed(self.client.get(self.url(path))).send().await?;
        Self::read_json(response, what).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        body: &B,
        what: &str,
    ) -> Result<T> {
        let response = self.authed(builder).json(body).send().await?;
        Self::read_json(response, what).await
    }

    // ===== AUTH =====

    /// Registers the account and signs straight in with the same credentials.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<LoginResponse> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(payload)
            .send()
            .await?;
        Self::ensure_success(response, "register").await?;
        self.login(&payload.email, &payload.password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let payload = LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&payload)
            .send()
            .await?;
        Self::read_json(response, "log in").await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/auth/me", "fetch user").await
    }

    // ===== VACANCIES =====

    pub async fn list_vacancies(&self, query: &VacancyQuery) -> Result<VacancyPage> {
        let response = self
            .client
            .get(self.url("/vacancies"))
            .query(query)
            .send()
            .await?;
        Self::read_json(response, "fetch vacancies").await
    }

    pub async fn get_vacancy(&self, id: i64) -> Result<Vacancy> {
        self.get_json(&format!("/vacancies/{}", id), "fetch vacancy").await
    }

    pub async fn create_vacancy(&self, employer_id: i64, draft: &VacancyDraft) -> Result<Vacancy> {
        let builder = self
            .client
            .post(self.url("/vacancies"))
            .query(&[("employer_id", employer_id)]);
        self.send_json(builder, draft, "create vacancy").await
    }

    pub async fn update_vacancy(&self, id: i64, patch: &VacancyPatch) -> Result<Vacancy> {
        let builder = self.client.put(self.url(&format!("/vacancies/{}", id)));
        self.send_json(builder, patch, "update vacancy").await
    }

    pub async fn delete_vacancy(&self, id: i64) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/vacancies/{}", id))))
            .send()
            .await?;
        Self::ensure_success(response, "delete vacancy").await?;
        Ok(())
    }

    pub async fn companies(&self) -> Result<Vec<String>> {
        let page = self.list_vacancies(&VacancyQuery::default()).await?;
        Ok(distinct(page.vacancies.iter().map(|v| v.company.clone())))
    }

    pub async fn locations(&self) -> Result<Vec<String>> {
        let page = self.list_vacancies(&VacancyQuery::default()).await?;
        Ok(distinct(page.vacancies.iter().map(|v| v.location.clone())))
    }

    /// Other open vacancies posted by the same employer as `vacancy_id`.
    pub async fn alternatives_for(&self, vacancy_id: i64, limit: usize) -> Result<Vec<Vacancy>> {
        let vacancy = self.get_vacancy(vacancy_id).await?;
        let query = VacancyQuery {
            company: Some(vacancy.company.clone()),
            per_page: Some(20),
            ..Default::default()
        };
        let page = self.list_vacancies(&query).await?;
        Ok(page
            .vacancies
            .into_iter()
            .filter(|v| v.id != vacancy.id && v.employer_id == vacancy.employer_id && v.is_active)
            .take(limit)
            .collect())
    }

    // ===== APPLICATIONS =====

    pub async fn create_application(
        &self,
        job_seeker_id: i64,
        payload: &NewApplication,
    ) -> Result<Application> {
        let builder = self
            .client
            .post(self.url("/applications"))
            .query(&[("job_seeker_id", job_seeker_id)]);
        self.send_json(builder, payload, "create application").await
    }

    pub async fn list_applications(&self, query: &ApplicationQuery) -> Result<ApplicationList> {
        let response = self
            .authed(self.client.get(self.url("/applications")).query(query))
            .send()
            .await?;
        Self::read_json(response, "fetch applications").await
    }

    pub async fn get_application(&self, id: i64) -> Result<Application> {
        self.get_json(&format!("/applications/{}", id), "fetch application")
            .await
    }

    pub async fn update_application(&self, id: i64, patch: &ApplicationPatch) -> Result<Application> {
        let builder = self.client.patch(self.url(&format!("/applications/{}", id)));
        self.send_json(builder, patch, "update application").await
    }

    /// Uploads straight to the backend upload URL as a binary multipart part.
    pub async fn upload_resume(
        &self,
        application_id: i64,
        file_name: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<UploadReceipt> {
        check_resume_size(data.len() as u64, self.max_resume_bytes)?;

        tracing::info!(
            application_id,
            size = data.len(),
            "Uploading resume {}",
            file_name
        );
        let mut part = multipart::Part::bytes(data).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part.mime_str(mime)?;
        }
        let form = multipart::Form::new().part("file", part);
        let url = format!(
            "{}/applications/{}/upload-resume",
            self.upload_url, application_id
        );
        let response = self
            .authed(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response, "upload resume").await
    }

    // ===== AI ANALYSIS =====

    pub async fn analyze_application(
        &self,
        application_id: i64,
        request: &AnalyzeRequest,
    ) -> Result<AnalysisReply> {
        let builder = self
            .client
            .post(self.url(&format!("/applications/{}/analyze", application_id)));
        self.send_json(builder, request, "analyze application").await
    }

    pub async fn send_chat_message(
        &self,
        application_id: i64,
        session_id: &str,
        message: &str,
    ) -> Result<AnalysisReply> {
        let body = ChatTurnRequest {
            session_id: session_id.to_string(),
            message: message.to_string(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/applications/{}/chat", application_id)));
        self.send_json(builder, &body, "send chat message").await
    }

    pub async fn get_ai_session(&self, application_id: i64, session_id: &str) -> Result<JsonValue> {
        self.get_json(
            &format!("/applications/{}/session/{}", application_id, session_id),
            "get AI session",
        )
        .await
    }

    // ===== BOT CHAT MESSAGES =====

    pub async fn list_messages(&self, application_id: i64) -> Result<Vec<ChatMessage>> {
        let response = self
            .authed(
                self.client
                    .get(self.url("/messages"))
                    .query(&[("application_id", application_id)]),
            )
            .send()
            .await?;
        let list: MessageList = Self::read_json(response, "fetch messages").await?;
        Ok(list.messages)
    }

    pub async fn create_message(
        &self,
        application_id: i64,
        sender: ChatSender,
        content: &str,
    ) -> Result<ChatMessage> {
        let body = CreateChatMessage {
            application_id,
            sender_type: sender,
            content: content.to_string(),
        };
        let builder = self.client.post(self.url("/messages"));
        self.send_json(builder, &body, "create message").await
    }

    // ===== APPLICATION ACTIONS =====

    pub async fn application_action(
        &self,
        application_id: i64,
        action: ReviewAction,
        message: Option<String>,
    ) -> Result<ActionReceipt> {
        let body = ActionRequest { action, message };
        let builder = self
            .client
            .post(self.url(&format!("/applications/{}/action", application_id)));
        self.send_json(builder, &body, "handle application action").await
    }

    // ===== EMPLOYER-CANDIDATE CHAT =====

    pub async fn employer_thread(&self, application_id: i64) -> Result<Vec<EmployerMessage>> {
        let list: EmployerMessageList = self
            .get_json(
                &format!("/applications/{}/employer-chat", application_id),
                "fetch employer-candidate messages",
            )
            .await?;
        Ok(list.messages)
    }

    pub async fn send_employer_message(
        &self,
        application_id: i64,
        content: &str,
        sender_user_id: i64,
    ) -> Result<EmployerMessage> {
        let body = SendEmployerMessage {
            application_id,
            content: content.to_string(),
        };
        let builder = self
            .client
            .post(self.url(&format!("/applications/{}/employer-chat", application_id)))
            .query(&[("sender_user_id", sender_user_id)]);
        self.send_json(builder, &body, "send message").await
    }

    pub async fn mark_message_read(&self, application_id: i64, message_id: i64) -> Result<()> {
        let url = self.url(&format!(
            "/applications/{}/employer-chat/{}/read",
            application_id, message_id
        ));
        let response = self.authed(self.client.patch(url)).send().await?;
        Self::ensure_success(response, "mark message as read").await?;
        Ok(())
    }
}

#[async_trait]
impl ScreeningBackend for BackendClient {
    async fn analyze(&self, application_id: i64) -> Result<AnalysisReply> {
        self.analyze_application(application_id, &AnalyzeRequest::default())
            .await
    }

    async fn chat_turn(
        &self,
        application_id: i64,
        session_id: &str,
        message: &str,
    ) -> Result<AnalysisReply> {
        self.send_chat_message(application_id, session_id, message)
            .await
    }

    async fn history(&self, application_id: i64) -> Result<Vec<ChatMessage>> {
        self.list_messages(application_id).await
    }

    async fn record_message(
        &self,
        application_id: i64,
        sender: ChatSender,
        content: &str,
    ) -> Result<ChatMessage> {
        self.create_message(application_id, sender, content).await
    }

    async fn alternative_vacancies(&self, vacancy_id: i64, limit: usize) -> Result<Vec<Vacancy>> {
        self.alternatives_for(vacancy_id, limit).await
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Pulls the human-readable reason out of a backend error body.
fn upstream_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    for key in ["detail", "error", "message"] {
        match value.get(key) {
            Some(JsonValue::String(text)) if !text.is_empty() => return Some(text.clone()),
            Some(other @ (JsonValue::Array(_) | JsonValue::Object(_))) => {
                return Some(other.to_string())
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_message_prefers_detail() {
        assert_eq!(
            upstream_message(r#"{"detail":"Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        assert_eq!(
            upstream_message(r#"{"error":"Failed to proxy request"}"#).as_deref(),
            Some("Failed to proxy request")
        );
        assert_eq!(upstream_message("<html>502</html>"), None);
        let nested = upstream_message(&json!({"detail": [{"loc": ["body"]}]}).to_string());
        assert!(nested.unwrap().contains("loc"));
    }

    #[test]
    fn distinct_sorts_and_drops_empty() {
        let values = vec!["Kazan".to_string(), "".to_string(), "Almaty".to_string(), "Kazan".to_string()];
        assert_eq!(distinct(values.into_iter()), vec!["Almaty", "Kazan"]);
    }

    #[tokio::test]
    async fn oversized_resume_is_rejected_before_any_request() {
        // Nothing listens on this port; reaching the network would surface a Reqwest error.
        let client = BackendClient::new(Client::new(), "http://127.0.0.1:9").with_max_resume_bytes(1024);
        let err = client
            .upload_resume(7, "cv.pdf", Some("application/pdf"), vec![0u8; 2048])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { size: 2048, limit: 1024 }));
    }
}
