use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::application::{Application, RelevanceBadge};
use crate::models::vacancy::Vacancy;

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct CandidateQuery {
    pub status: Option<String>,
    pub relevance: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub reviewed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
pub struct BucketCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CandidateRow {
    pub application: Application,
    pub badge: RelevanceBadge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CandidateOverview {
    pub vacancy: Vacancy,
    pub candidates: Vec<CandidateRow>,
    pub counts: StatusCounts,
    pub buckets: BucketCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeekerApplicationRow {
    pub application: Application,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeekerOverview {
    pub applications: Vec<SeekerApplicationRow>,
    pub counts: StatusCounts,
}
