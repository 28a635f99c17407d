use std::path::Path as StdPath;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ActionReceipt, ActionRequest, ApplicationList, ApplicationPatch, ApplicationQuery,
        NewApplication, ReviewAction, UploadReceipt,
    },
    error::{Error, Result},
    models::{
        application::{Application, ApplicationStatus},
        message::{EmployerMessage, ThreadSender},
        user::UserRole,
    },
    routes::demo::{auth::current_user, DemoState},
    utils::{
        token::Claims,
        validation::{check_resume_file, check_resume_size},
    },
};

pub const ACCEPTED_NOTICE: &str =
    "Your application has been accepted. The employer will continue the conversation here.";

#[derive(Debug, Deserialize)]
pub struct SeekerParam {
    pub job_seeker_id: i64,
}

async fn with_relations(state: &DemoState, mut application: Application) -> Application {
    if let Ok(Some(vacancy)) = state.store.vacancies.get(application.vacancy_id).await {
        application.vacancy = Some(vacancy);
    }
    if let Ok(Some(account)) = state.store.accounts.get(application.job_seeker_id).await {
        application.job_seeker = Some(account.user);
    }
    application
}

pub async fn create_application(
    State(state): State<DemoState>,
    Query(seeker): Query<SeekerParam>,
    Json(payload): Json<NewApplication>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let vacancy = state.vacancy(payload.vacancy_id).await?;
    if !vacancy.is_active {
        return Err(Error::BadRequest("Vacancy is closed".to_string()));
    }
    let duplicate = state
        .store
        .applications
        .list()
        .await?
        .into_iter()
        .any(|a| a.vacancy_id == vacancy.id && a.job_seeker_id == seeker.job_seeker_id);
    if duplicate {
        return Err(Error::BadRequest(
            "You have already applied to this vacancy".to_string(),
        ));
    }

    let application = state
        .store
        .applications
        .create(Application {
            id: 0,
            cover_letter: payload.cover_letter.filter(|c| !c.trim().is_empty()),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
            job_seeker_id: seeker.job_seeker_id,
            vacancy_id: vacancy.id,
            vacancy: None,
            job_seeker: None,
            relevance_score: None,
            ai_summary: None,
            ai_detailed_analysis: None,
            mismatch_reasons: Vec::new(),
            rejection_tags: None,
            chat_completed: false,
            resume_filename: None,
        })
        .await?;
    tracing::info!(
        application_id = application.id,
        vacancy_id = vacancy.id,
        "Application created"
    );
    Ok((
        StatusCode::CREATED,
        Json(with_relations(&state, application).await),
    ))
}

pub async fn list_applications(
    State(state): State<DemoState>,
    Query(query): Query<ApplicationQuery>,
) -> Result<impl IntoResponse> {
    let mut matching: Vec<Application> = state
        .store
        .applications
        .list()
        .await?
        .into_iter()
        .filter(|a| query.vacancy_id.map_or(true, |id| a.vacancy_id == id))
        .filter(|a| query.job_seeker_id.map_or(true, |id| a.job_seeker_id == id))
        .filter(|a| query.status.map_or(true, |s| a.status == s))
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if let Some(limit) = query.per_page.filter(|n| *n > 0) {
        matching.truncate(limit as usize);
    }

    let mut applications = Vec::with_capacity(matching.len());
    for application in matching {
        applications.push(with_relations(&state, application).await);
    }
    Ok(Json(ApplicationList { applications }))
}

pub async fn get_application(
    State(state): State<DemoState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state.application(id).await?;
    Ok(Json(with_relations(&state, application).await))
}

pub async fn update_application(
    State(state): State<DemoState>,
    Path(id): Path<i64>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<impl IntoResponse> {
    let mut application = state.application(id).await?;
    if let Some(status) = patch.status {
        if status != application.status && !application.status.can_transition_to(status) {
            return Err(Error::BadRequest(format!(
                "Cannot change status from {} to {}",
                application.status, status
            )));
        }
        application.status = status;
    }
    if let Some(score) = patch.relevance_score {
        application.relevance_score = Some(score.clamp(0.0, 1.0));
    }
    if let Some(reasons) = patch.mismatch_reasons {
        application.mismatch_reasons = reasons;
    }
    if let Some(done) = patch.chat_completed {
        application.chat_completed = done;
    }
    if patch.ai_summary.is_some() {
        application.ai_summary = patch.ai_summary;
    }
    application.updated_at = Some(Utc::now());
    let application = state.store.applications.update(application).await?;
    Ok(Json(with_relations(&state, application).await))
}

pub async fn upload_resume(
    State(state): State<DemoState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut application = state.application(id).await?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let data = field.bytes().await?;
        check_resume_size(data.len() as u64, state.max_resume_bytes)?;
        let ext = check_resume_file(&file_name, &data)?;

        if ext == "txt" {
            let text = String::from_utf8_lossy(&data).into_owned();
            if let Ok(mut resumes) = state.resumes.write() {
                resumes.insert(id, text);
            }
        }
        let stored_name = StdPath::new(&file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();
        application.resume_filename = Some(stored_name.clone());
        application.updated_at = Some(Utc::now());
        state.store.applications.update(application).await?;

        tracing::info!(application_id = id, size = data.len(), "Resume stored");
        return Ok(Json(UploadReceipt {
            message: "Resume uploaded successfully".to_string(),
            filename: stored_name,
        }));
    }
    Err(Error::BadRequest("Multipart field 'file' is required".to_string()))
}

pub async fn application_action(
    State(state): State<DemoState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    let employer = current_user(&state, &claims).await?;
    let mut application = state.application(id).await?;
    let vacancy = state.vacancy(application.vacancy_id).await?;
    if employer.role != UserRole::Employer || vacancy.employer_id != employer.id {
        return Err(Error::Forbidden(
            "Only the vacancy owner can decide on applications".to_string(),
        ));
    }

    if application.status.is_terminal() {
        return Ok(Json(ActionReceipt {
            status: application.status,
            message: format!("Application is already {}", application.status),
        }));
    }

    let target = request.action.target_status();
    application.status = target;
    application.updated_at = Some(Utc::now());
    state.store.applications.update(application).await?;

    if request.action == ReviewAction::Accept {
        post_thread_message(&state, id, ThreadSender::System, 0, None, ACCEPTED_NOTICE).await?;
    }
    if let Some(note) = request.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        post_thread_message(
            &state,
            id,
            ThreadSender::Employer,
            employer.id,
            Some(employer.full_name.clone()),
            note,
        )
        .await?;
    }

    tracing::info!(application_id = id, status = %target, "Employer decision recorded");
    Ok(Json(ActionReceipt {
        status: target,
        message: match request.action {
            ReviewAction::Accept => "Application accepted".to_string(),
            ReviewAction::Reject => "Application rejected".to_string(),
        },
    }))
}

pub async fn post_thread_message(
    state: &DemoState,
    application_id: i64,
    sender_type: ThreadSender,
    sender_id: i64,
    sender_name: Option<String>,
    content: &str,
) -> Result<EmployerMessage> {
    state
        .store
        .employer_messages
        .create(EmployerMessage {
            id: 0,
            application_id,
            sender_type,
            sender_id,
            sender_name,
            content: content.to_string(),
            created_at: Utc::now(),
            is_read: false,
        })
        .await
}
