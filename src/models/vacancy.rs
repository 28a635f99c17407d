use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vacancy {
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary_min: Option<f64>,
    #[serde(default)]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub responsibilities: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub remote_work: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub employer_id: i64,
}

fn default_active() -> bool {
    true
}

impl Vacancy {
    /// Plain-text rendering handed to the screening service.
    pub fn screening_text(&self) -> String {
        let mut text = format!("{} ({})\n{}\n", self.title, self.company, self.location);
        if !self.description.is_empty() {
            text.push_str(&format!("\n{}\n", self.description));
        }
        if !self.requirements.is_empty() {
            text.push_str(&format!("\nRequirements:\n{}\n", self.requirements));
        }
        if let Some(responsibilities) = &self.responsibilities {
            text.push_str(&format!("\nResponsibilities:\n{}\n", responsibilities));
        }
        text
    }
}
