use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::models::user::User;
use crate::models::vacancy::Vacancy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Accepted and rejected applications take no further employer actions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewed) | (Pending, Accepted) | (Pending, Rejected)
                | (Reviewed, Accepted)
                | (Reviewed, Rejected)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{}'", other)),
        }
    }
}

pub const MEDIUM_RELEVANCE_FLOOR: f64 = 0.4;
pub const HIGH_RELEVANCE_FLOOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceBucket {
    Low,
    Medium,
    High,
}

impl RelevanceBucket {
    /// Half-open intervals over the 0..1 score: [0, 0.4) low, [0.4, 0.7) medium, [0.7, 1] high.
    pub fn from_score(score: f64) -> Self {
        let score = clamp_score(score);
        if score >= HIGH_RELEVANCE_FLOOR {
            RelevanceBucket::High
        } else if score >= MEDIUM_RELEVANCE_FLOOR {
            RelevanceBucket::Medium
        } else {
            RelevanceBucket::Low
        }
    }

    pub fn from_percent(percent: f64) -> Self {
        Self::from_score(percent / 100.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelevanceBucket::Low => "low",
            RelevanceBucket::Medium => "medium",
            RelevanceBucket::High => "high",
        }
    }
}

impl FromStr for RelevanceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RelevanceBucket::Low),
            "medium" => Ok(RelevanceBucket::Medium),
            "high" => Ok(RelevanceBucket::High),
            other => Err(format!("unknown relevance bucket '{}'", other)),
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Whole percent shown next to a relevance badge.
pub fn relevance_percent(score: f64) -> u8 {
    (clamp_score(score) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RelevanceBadge {
    pub bucket: RelevanceBucket,
    pub percent: u8,
    pub label: String,
}

impl RelevanceBadge {
    pub fn for_score(score: Option<f64>) -> Self {
        let score = score.unwrap_or(0.0);
        let bucket = RelevanceBucket::from_score(score);
        let percent = relevance_percent(score);
        let label = match bucket {
            RelevanceBucket::High => format!("High: {}%", percent),
            RelevanceBucket::Medium => format!("Medium: {}%", percent),
            RelevanceBucket::Low => format!("Low: {}%", percent),
        };
        Self {
            bucket,
            percent,
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: i64,
    #[serde(default)]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub job_seeker_id: i64,
    pub vacancy_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<Vacancy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_seeker: Option<User>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub ai_detailed_analysis: Option<String>,
    #[serde(default)]
    pub mismatch_reasons: Vec<String>,
    #[serde(default)]
    pub rejection_tags: Option<String>,
    #[serde(default)]
    pub chat_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_filename: Option<String>,
}

impl Application {
    pub fn relevance_bucket(&self) -> RelevanceBucket {
        RelevanceBucket::from_score(self.relevance_score.unwrap_or(0.0))
    }

    pub fn rejection_tags(&self) -> Vec<&str> {
        self.rejection_tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries_are_half_open() {
        assert_eq!(RelevanceBucket::from_score(0.0), RelevanceBucket::Low);
        assert_eq!(RelevanceBucket::from_score(0.39), RelevanceBucket::Low);
        assert_eq!(RelevanceBucket::from_score(0.4), RelevanceBucket::Medium);
        assert_eq!(RelevanceBucket::from_score(0.69), RelevanceBucket::Medium);
        assert_eq!(RelevanceBucket::from_score(0.7), RelevanceBucket::High);
        assert_eq!(RelevanceBucket::from_score(1.0), RelevanceBucket::High);
    }

    #[test]
    fn bucket_is_total_outside_unit_range() {
        assert_eq!(RelevanceBucket::from_score(-0.2), RelevanceBucket::Low);
        assert_eq!(RelevanceBucket::from_score(1.7), RelevanceBucket::High);
        assert_eq!(RelevanceBucket::from_score(f64::NAN), RelevanceBucket::Low);
        assert_eq!(RelevanceBucket::from_percent(40.0), RelevanceBucket::Medium);
    }

    #[test]
    fn badge_renders_bucket_and_percent() {
        let high = RelevanceBadge::for_score(Some(0.7));
        assert_eq!(high.bucket, RelevanceBucket::High);
        assert_eq!(high.percent, 70);

        let medium = RelevanceBadge::for_score(Some(0.69));
        assert_eq!(medium.bucket, RelevanceBucket::Medium);
        assert_eq!(medium.percent, 69);
        assert_eq!(medium.label, "Medium: 69%");

        let missing = RelevanceBadge::for_score(None);
        assert_eq!(missing.bucket, RelevanceBucket::Low);
        assert_eq!(missing.percent, 0);
    }

    #[test]
    fn transitions_only_leave_open_states() {
        use ApplicationStatus::*;
        assert!(Pending.can_transition_to(Reviewed));
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Reviewed.can_transition_to(Accepted));
        assert!(!Reviewed.can_transition_to(Pending));
        for next in ApplicationStatus::ALL {
            assert!(!Accepted.can_transition_to(next));
            assert!(!Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn rejection_tags_are_trimmed() {
        let json = serde_json::json!({
            "id": 1,
            "status": "rejected",
            "created_at": "2024-05-01T10:00:00Z",
            "job_seeker_id": 2,
            "vacancy_id": 3,
            "rejection_tags": "no_relocation, salary ,"
        });
        let app: Application = serde_json::from_value(json).unwrap();
        assert_eq!(app.rejection_tags(), vec!["no_relocation", "salary"]);
        assert!(app.mismatch_reasons.is_empty());
    }
}
