use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::vacancy::Vacancy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DialogStage {
    Questioning,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    Assistant,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSignal {
    Server,
    TurnCap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub text: String,
    pub at: DateTime<Utc>,
    /// Set on assistant lines synthesized locally after a failed call.
    #[serde(default)]
    pub fallback: bool,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            text: text.into(),
            at: Utc::now(),
            fallback: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::Assistant,
            text: text.into(),
            at: Utc::now(),
            fallback: false,
        }
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::assistant(text)
        }
    }
}

/// Point-in-time view of an interview, as rendered by the chat widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InterviewSnapshot {
    pub application_id: i64,
    pub phase: InterviewPhase,
    pub session_id: Option<String>,
    pub turn_count: u32,
    pub turn_cap: Option<u32>,
    pub relevance_percent: Option<f64>,
    pub dialog_stage: Option<DialogStage>,
    pub is_completed: bool,
    pub completed_by: Option<CompletionSignal>,
    /// True while a start or reply call is in flight; the input stays disabled.
    pub busy: bool,
    pub summary: Option<String>,
    pub reasons: Vec<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub alternatives: Vec<Vacancy>,
}

impl InterviewSnapshot {
    pub fn accepts_input(&self) -> bool {
        self.phase == InterviewPhase::InProgress && !self.busy
    }
}
