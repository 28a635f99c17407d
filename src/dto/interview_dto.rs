use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Widget flags for this mount; the vacancy always comes from the application.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartInterviewPayload {
    #[serde(default)]
    pub embedded: bool,
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_auto_start() -> bool {
    true
}

impl Default for StartInterviewPayload {
    fn default() -> Self {
        Self {
            embedded: false,
            auto_start: default_auto_start(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InterviewTurnPayload {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
}
