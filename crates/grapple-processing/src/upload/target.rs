//! Upload-target stage: obtain a one-time destination and push the bytes to it.
//!
//! No retry here. A target is single use, so any failure ends the run.

use grapple_core::UploadError;
use grapple_video::{UploadTarget, VideoHost};

use super::staging::StagedFile;

#[tracing::instrument(skip(host, file), fields(
    size = file.size(),
    content_type = %file.content_type()
))]
pub async fn upload_to_host(
    host: &dyn VideoHost,
    file: StagedFile,
) -> Result<UploadTarget, UploadError> {
    let target = host
        .create_upload_target()
        .await
        .map_err(|e| UploadError::UploadInit(e.to_string()))?;

    tracing::debug!(upload_id = %target.upload_id, "Upload target issued");

    // The path guard keeps the staged file on disk until the transfer returns.
    let (source, _staged_path) = file
        .into_upload_source()
        .map_err(|e| UploadError::UploadTransfer(format!("staged file unreadable: {}", e)))?;

    host.transfer(&target, source)
        .await
        .map_err(|e| UploadError::UploadTransfer(e.to_string()))?;

    tracing::info!(upload_id = %target.upload_id, "File transferred to video host");
    Ok(target)
}
