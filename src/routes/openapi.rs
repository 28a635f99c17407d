use axum::Json;
use utoipa::OpenApi;

use crate::dto::application_dto::{ActionOutcome, ActionRequest, ReviewAction, UploadReceipt};
use crate::dto::interview_dto::{InterviewTurnPayload, StartInterviewPayload};
use crate::dto::message_dto::{ThreadMessagePayload, ThreadView};
use crate::dto::review_dto::{
    BucketCounts, CandidateOverview, CandidateRow, SeekerApplicationRow, SeekerOverview,
    StatusCounts,
};
use crate::models::application::{Application, ApplicationStatus, RelevanceBadge, RelevanceBucket};
use crate::models::interview::{
    CompletionSignal, DialogStage, InterviewPhase, InterviewSnapshot, TranscriptEntry,
    TranscriptRole,
};
use crate::models::message::{EmployerMessage, ThreadSender};
use crate::models::user::{User, UserRole};
use crate::models::vacancy::Vacancy;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::proxy::forward,
        crate::routes::interview::start_interview,
        crate::routes::interview::submit_turn,
        crate::routes::interview::get_interview,
        crate::routes::review::list_candidates,
        crate::routes::review::apply_action,
        crate::routes::review::my_applications,
        crate::routes::employer_chat::get_thread,
        crate::routes::employer_chat::post_message,
        crate::routes::employer_chat::mark_read,
        crate::routes::resume::upload_resume,
    ),
    components(schemas(
        ActionOutcome,
        ActionRequest,
        Application,
        ApplicationStatus,
        BucketCounts,
        CandidateOverview,
        CandidateRow,
        CompletionSignal,
        DialogStage,
        EmployerMessage,
        InterviewPhase,
        InterviewSnapshot,
        InterviewTurnPayload,
        RelevanceBadge,
        RelevanceBucket,
        ReviewAction,
        SeekerApplicationRow,
        SeekerOverview,
        StartInterviewPayload,
        StatusCounts,
        ThreadMessagePayload,
        ThreadSender,
        ThreadView,
        TranscriptEntry,
        TranscriptRole,
        UploadReceipt,
        User,
        UserRole,
        Vacancy,
    )),
    tags((name = "smartbot-portal", description = "Recruitment portal backend-for-frontend"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
