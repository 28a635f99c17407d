use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    dto::vacancy_dto::{VacancyDraft, VacancyPage, VacancyPatch, VacancyQuery},
    error::{Error, Result},
    models::{user::UserRole, vacancy::Vacancy},
    routes::demo::{auth::current_user, DemoState},
    utils::token::Claims,
};

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn matches_query(vacancy: &Vacancy, query: &VacancyQuery) -> bool {
    // Employers see their closed vacancies too.
    if query.employer_id.is_none() && !vacancy.is_active {
        return false;
    }
    if let Some(employer_id) = query.employer_id {
        if vacancy.employer_id != employer_id {
            return false;
        }
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let hit = contains_ci(&vacancy.title, search)
            || contains_ci(&vacancy.description, search)
            || contains_ci(&vacancy.requirements, search);
        if !hit {
            return false;
        }
    }
    if let Some(company) = query.company.as_deref().filter(|s| !s.is_empty()) {
        if !contains_ci(&vacancy.company, company) {
            return false;
        }
    }
    if let Some(location) = query.location.as_deref().filter(|s| !s.is_empty()) {
        if !contains_ci(&vacancy.location, location) {
            return false;
        }
    }
    if let Some(level) = query.experience_level.as_deref().filter(|s| !s.is_empty()) {
        if vacancy.experience_level.as_deref() != Some(level) {
            return false;
        }
    }
    if let Some(remote) = query.remote_work {
        if vacancy.remote_work != remote {
            return false;
        }
    }
    true
}

pub fn paginate(mut vacancies: Vec<Vacancy>, query: &VacancyQuery) -> VacancyPage {
    vacancies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = query.page.unwrap_or(1).max(1);
    let total = vacancies.len() as i64;
    let total_pages = (total + per_page - 1) / per_page;
    let vacancies = vacancies
        .into_iter()
        .skip(((page - 1) * per_page) as usize)
        .take(per_page as usize)
        .collect();
    VacancyPage {
        vacancies,
        total,
        page,
        per_page,
        total_pages,
    }
}

pub async fn list_vacancies(
    State(state): State<DemoState>,
    Query(query): Query<VacancyQuery>,
) -> Result<impl IntoResponse> {
    let matching = state
        .store
        .vacancies
        .list()
        .await?
        .into_iter()
        .filter(|v| matches_query(v, &query))
        .collect();
    Ok(Json(paginate(matching, &query)))
}

pub async fn get_vacancy(
    State(state): State<DemoState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.vacancy(id).await?))
}

pub async fn create_vacancy(
    State(state): State<DemoState>,
    Extension(claims): Extension<Claims>,
    Json(draft): Json<VacancyDraft>,
) -> Result<impl IntoResponse> {
    draft.validate()?;
    let employer = current_user(&state, &claims).await?;
    if employer.role != UserRole::Employer {
        return Err(Error::Forbidden("Only employers can post vacancies".to_string()));
    }

    let vacancy = state
        .store
        .vacancies
        .create(Vacancy {
            id: 0,
            title: draft.title,
            company: draft.company,
            location: draft.location,
            salary_min: draft.salary_min,
            salary_max: draft.salary_max,
            currency: draft.currency,
            description: draft.description,
            requirements: draft.requirements,
            responsibilities: draft.responsibilities,
            benefits: draft.benefits,
            employment_type: draft.employment_type,
            experience_level: draft.experience_level,
            remote_work: draft.remote_work,
            is_active: draft.is_active,
            created_at: Utc::now(),
            updated_at: None,
            employer_id: employer.id,
        })
        .await?;
    tracing::info!(vacancy_id = vacancy.id, employer_id = employer.id, "Vacancy created");
    Ok((StatusCode::CREATED, Json(vacancy)))
}

async fn owned_vacancy(state: &DemoState, claims: &Claims, id: i64) -> Result<Vacancy> {
    let vacancy = state.vacancy(id).await?;
    if claims.user_id() != Some(vacancy.employer_id) {
        return Err(Error::Forbidden("Vacancy belongs to another employer".to_string()));
    }
    Ok(vacancy)
}

pub async fn update_vacancy(
    State(state): State<DemoState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(patch): Json<VacancyPatch>,
) -> Result<impl IntoResponse> {
    patch.validate()?;
    let mut vacancy = owned_vacancy(&state, &claims, id).await?;
    patch.apply(&mut vacancy);
    vacancy.updated_at = Some(Utc::now());
    Ok(Json(state.store.vacancies.update(vacancy).await?))
}

/// Closes the vacancy; applications keep pointing at it.
pub async fn delete_vacancy(
    State(state): State<DemoState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let mut vacancy = owned_vacancy(&state, &claims, id).await?;
    vacancy.is_active = false;
    vacancy.updated_at = Some(Utc::now());
    state.store.vacancies.update(vacancy).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn vacancy(id: i64, title: &str, company: &str, remote: bool) -> Vacancy {
        Vacancy {
            id,
            title: title.to_string(),
            company: company.to_string(),
            location: "Kazan".to_string(),
            salary_min: None,
            salary_max: None,
            currency: None,
            description: String::new(),
            requirements: "Rust, Tokio".to_string(),
            responsibilities: None,
            benefits: None,
            employment_type: None,
            experience_level: Some("3_6_years".to_string()),
            remote_work: remote,
            is_active: true,
            created_at: Utc::now() - Duration::minutes(id),
            updated_at: None,
            employer_id: 1,
        }
    }

    #[test]
    fn search_spans_title_and_requirements() {
        let v = vacancy(1, "Backend Engineer", "Acme", false);
        let by_req = VacancyQuery {
            search: Some("tokio".into()),
            ..Default::default()
        };
        assert!(matches_query(&v, &by_req));
        let miss = VacancyQuery {
            search: Some("golang".into()),
            ..Default::default()
        };
        assert!(!matches_query(&v, &miss));
        let remote_only = VacancyQuery {
            remote_work: Some(true),
            ..Default::default()
        };
        assert!(!matches_query(&v, &remote_only));
    }

    #[test]
    fn pagination_reports_totals_newest_first() {
        let all: Vec<_> = (1..=5).map(|i| vacancy(i, "Dev", "Acme", true)).collect();
        let page = paginate(
            all,
            &VacancyQuery {
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let ids: Vec<i64> = page.vacancies.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
