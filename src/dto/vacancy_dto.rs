use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::vacancy::Vacancy;

#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct VacancyQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_work: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VacancyPage {
    pub vacancies: Vec<Vacancy>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VacancyDraft {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    #[serde(default)]
    pub remote_work: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate, ToSchema)]
pub struct VacancyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_work: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl VacancyPatch {
    pub fn apply(self, vacancy: &mut Vacancy) {
        if let Some(v) = self.title {
            vacancy.title = v;
        }
        if let Some(v) = self.company {
            vacancy.company = v;
        }
        if let Some(v) = self.location {
            vacancy.location = v;
        }
        if self.salary_min.is_some() {
            vacancy.salary_min = self.salary_min;
        }
        if self.salary_max.is_some() {
            vacancy.salary_max = self.salary_max;
        }
        if self.currency.is_some() {
            vacancy.currency = self.currency;
        }
        if let Some(v) = self.description {
            vacancy.description = v;
        }
        if let Some(v) = self.requirements {
            vacancy.requirements = v;
        }
        if self.responsibilities.is_some() {
            vacancy.responsibilities = self.responsibilities;
        }
        if self.benefits.is_some() {
            vacancy.benefits = self.benefits;
        }
        if self.employment_type.is_some() {
            vacancy.employment_type = self.employment_type;
        }
        if self.experience_level.is_some() {
            vacancy.experience_level = self.experience_level;
        }
        if let Some(v) = self.remote_work {
            vacancy.remote_work = v;
        }
        if let Some(v) = self.is_active {
            vacancy.is_active = v;
        }
    }
}
