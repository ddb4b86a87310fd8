use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::read_upload_form;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use grapple_core::models::UploadAccepted;
use std::sync::Arc;

/// Accept a video and its metadata.
///
/// Responds once the record exists in `uploading`; the transfer to the video
/// host and the wait for a playback id happen in the background. Poll
/// `GET /api/v0/videos/{id}` for the outcome.
#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Parts: file (binary), title, position, userId, description?, thumbnailTime?"
    ),
    responses(
        (status = 200, description = "Upload accepted", body = UploadAccepted),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 503, description = "Upload pipeline unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let intake = &state.uploads.intake;
    let form = read_upload_form(multipart, intake).await?;

    let accepted = intake.start_upload(form.file, form.metadata).await?;

    tracing::info!(record_id = %accepted.record_id, "Video upload accepted");

    Ok(Json(accepted))
}
