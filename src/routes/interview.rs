use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::interview_dto::{InterviewTurnPayload, StartInterviewPayload},
    error::{Error, Result},
    middleware::auth::AuthContext,
    services::interview_service::{ScreeningBackend, WidgetFlags},
    AppState,
};

/// Id of the user behind the bearer token, as the backend sees it.
async fn caller_id(state: &AppState, auth: &AuthContext) -> Result<i64> {
    Ok(state.backend(auth).current_user().await?.id)
}

#[utoipa::path(
    post,
    path = "/api/interviews/{application_id}/start",
    params(("application_id" = i64, Path, description = "Application ID")),
    request_body = StartInterviewPayload,
    responses(
        (status = 200, description = "Interview state after start", body = InterviewSnapshot),
        (status = 401, description = "Missing bearer token"),
        (status = 403, description = "Application belongs to another user")
    )
)]
#[axum::debug_handler]
pub async fn start_interview(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
    payload: Option<Json<StartInterviewPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let client = state.backend(&auth);
    let caller = client.current_user().await?;
    let application = client.get_application(application_id).await?;
    if application.job_seeker_id != caller.id {
        return Err(Error::Forbidden(
            "Only the applicant can take this interview".to_string(),
        ));
    }

    let session = state
        .interviews
        .open(application_id, caller.id, application.vacancy_id)?;
    let flags = WidgetFlags {
        embedded: payload.embedded,
        auto_start: payload.auto_start,
    };
    let backend: Arc<dyn ScreeningBackend> = Arc::new(client);
    Ok(Json(session.begin(backend, flags).await?))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{application_id}/turn",
    params(("application_id" = i64, Path, description = "Application ID")),
    request_body = InterviewTurnPayload,
    responses(
        (status = 200, description = "Interview state after the answer", body = InterviewSnapshot),
        (status = 403, description = "Interview belongs to another user"),
        (status = 404, description = "Interview was never opened"),
        (status = 409, description = "Interview completed or an answer is already pending")
    )
)]
#[axum::debug_handler]
pub async fn submit_turn(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
    Json(payload): Json<InterviewTurnPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = caller_id(&state, &auth).await?;
    let session = state.interviews.get(application_id, user_id)?;
    let snapshot = session
        .submit(state.screening_backend(&auth), &payload.message)
        .await?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{application_id}",
    params(("application_id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Current interview state", body = InterviewSnapshot),
        (status = 401, description = "Missing bearer token"),
        (status = 403, description = "Interview belongs to another user"),
        (status = 404, description = "Interview was never opened")
    )
)]
#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user_id = caller_id(&state, &auth).await?;
    let session = state.interviews.get(application_id, user_id)?;
    Ok(Json(session.snapshot()?))
}
