use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use grapple_core::models::UploadRecord;
use grapple_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Upload record ID")
    ),
    responses(
        (status = 200, description = "Upload record", body = UploadRecord),
        (status = 404, description = "Upload record not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(record_id = %id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .uploads
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload record not found".to_string()))?;

    Ok(Json(record))
}
