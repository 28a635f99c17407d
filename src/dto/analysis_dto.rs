use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::interview::DialogStage;

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub cv_text: Option<String>,
    #[serde(default)]
    pub vacancy_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurnRequest {
    pub session_id: String,
    pub message: String,
}

/// Reply shape shared by the analyze and chat endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReply {
    pub session_id: String,
    #[serde(default)]
    pub relevance_percent: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub summary_for_employer: String,
    #[serde(default)]
    pub bot_reply: Option<String>,
    #[serde(default)]
    pub dialog_stage: Option<DialogStage>,
    #[serde(default)]
    pub is_completed: bool,
    // Older backends answered with these instead of `bot_reply`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bot_replies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followup_questions: Vec<String>,
}

impl AnalysisReply {
    pub fn bot_text(&self) -> Option<String> {
        if let Some(reply) = self.bot_reply.as_ref().filter(|r| !r.trim().is_empty()) {
            return Some(reply.trim().to_string());
        }
        if !self.bot_replies.is_empty() {
            return Some(self.bot_replies.join("\n"));
        }
        self.followup_questions.first().cloned()
    }

    pub fn reports_completion(&self) -> bool {
        self.is_completed || self.dialog_stage == Some(DialogStage::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_reply_fields_still_produce_bot_text() {
        let reply: AnalysisReply = serde_json::from_value(serde_json::json!({
            "session_id": "s-1",
            "relevance_percent": 55,
            "bot_replies": ["Thanks!", "How many years of Rust?"]
        }))
        .unwrap();
        assert_eq!(reply.bot_text().as_deref(), Some("Thanks!\nHow many years of Rust?"));
        assert!(!reply.reports_completion());
    }

    #[test]
    fn completed_stage_counts_as_completion() {
        let reply: AnalysisReply = serde_json::from_value(serde_json::json!({
            "session_id": "s-1",
            "relevance_percent": 80.5,
            "bot_reply": "  Thank you.  ",
            "dialog_stage": "completed"
        }))
        .unwrap();
        assert!(reply.reports_completion());
        assert_eq!(reply.bot_text().as_deref(), Some("Thank you."));
    }

    #[test]
    fn unknown_dialog_stage_is_tolerated() {
        let reply: AnalysisReply = serde_json::from_value(serde_json::json!({
            "session_id": "s-2",
            "dialog_stage": "warming_up"
        }))
        .unwrap();
        assert_eq!(reply.dialog_stage, Some(DialogStage::Unknown));
    }
}
