use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    error::{Error, Result},
    middleware::auth::AuthContext,
    utils::validation::{check_resume_file, check_resume_size},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/{id}/resume",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Resume stored by the backend", body = UploadReceipt),
        (status = 400, description = "Missing, empty or unsupported file"),
        (status = 413, description = "File exceeds the resume size limit")
    )
)]
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(application_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        check_resume_size(data.len() as u64, state.config.max_resume_bytes)?;
        check_resume_file(&file_name, &data)?;

        let receipt = state
            .backend(&auth)
            .upload_resume(
                application_id,
                &file_name,
                content_type.as_deref(),
                data.to_vec(),
            )
            .await?;
        return Ok(Json(receipt));
    }
    Err(Error::BadRequest("Multipart field 'file' is required".to_string()))
}
