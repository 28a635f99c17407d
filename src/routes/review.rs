use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::application_dto::ActionRequest,
    dto::review_dto::CandidateQuery,
    error::{Error, Result},
    middleware::auth::AuthContext,
    models::user::UserRole,
    services::review_service::ReviewService,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/vacancies/{id}/candidates",
    params(
        ("id" = i64, Path, description = "Vacancy ID"),
        ("status" = Option<String>, Query, description = "all | pending | reviewed | accepted | rejected"),
        ("relevance" = Option<String>, Query, description = "all | high | medium | low"),
        ("tag" = Option<String>, Query, description = "Rejection tag or all")
    ),
    responses(
        (status = 200, description = "Filtered candidates with tab and bucket counts", body = CandidateOverview),
        (status = 400, description = "Unknown filter value")
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(vacancy_id): Path<i64>,
    Query(query): Query<CandidateQuery>,
) -> Result<impl IntoResponse> {
    let overview = ReviewService::new(state.backend(&auth))
        .candidates(vacancy_id, &query)
        .await?;
    Ok(Json(overview))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/action",
    params(("id" = i64, Path, description = "Application ID")),
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Resulting status; accepted applications include the chat thread", body = ActionOutcome)
    )
)]
#[axum::debug_handler]
pub async fn apply_action(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
    Json(payload): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    let outcome = ReviewService::new(state.backend(&auth))
        .act(application_id, payload.action, payload.message)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/my/applications",
    responses(
        (status = 200, description = "Caller's applications with per-status counts", body = SeekerOverview),
        (status = 403, description = "Caller is not a job seeker")
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<impl IntoResponse> {
    let client = state.backend(&auth);
    let user = client.current_user().await?;
    if user.role != UserRole::JobSeeker {
        return Err(Error::Forbidden(
            "Only job seekers have an applications overview".to_string(),
        ));
    }
    let overview = ReviewService::new(client).seeker_overview(user.id).await?;
    Ok(Json(overview))
}
