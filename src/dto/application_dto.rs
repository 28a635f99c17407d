use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus};
use crate::models::message::EmployerMessage;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewApplication {
    pub vacancy_id: i64,
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct ApplicationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_seeker_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch_reasons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Accept,
    Reject,
}

impl ReviewAction {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            ReviewAction::Accept => ApplicationStatus::Accepted,
            ReviewAction::Reject => ApplicationStatus::Rejected,
        }
    }
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(ReviewAction::Accept),
            "reject" => Ok(ReviewAction::Reject),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionRequest {
    pub action: ReviewAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionReceipt {
    pub status: ApplicationStatus,
    pub message: String,
}

/// Outcome of an employer action as returned by the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionOutcome {
    pub application_id: i64,
    pub status: ApplicationStatus,
    /// False when the application was already accepted or rejected.
    pub changed: bool,
    pub message: String,
    pub thread: Vec<EmployerMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadReceipt {
    pub message: String,
    pub filename: String,
}
