use crate::error::ErrorResponse;
use grapple_core::models::{UploadAccepted, UploadRecord, UploadStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grapple API",
        version = "0.1.0",
        description = "Video upload intake and status for grappling technique videos. \
                       Uploads are accepted immediately and finish in the background."
    ),
    paths(
        crate::handlers::video_upload::upload_video,
        crate::handlers::video_get::get_video,
    ),
    components(schemas(UploadRecord, UploadStatus, UploadAccepted, ErrorResponse)),
    tags(
        (name = "videos", description = "Video upload and status")
    )
)]
pub struct ApiDoc;
