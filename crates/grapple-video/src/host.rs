use async_trait::async_trait;

use crate::error::VideoHostError;
use crate::types::{AssetStatus, UploadSource, UploadStatusInfo, UploadTarget};

/// Narrow contract the upload pipeline needs from a video host.
#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn create_upload_target(&self) -> Result<UploadTarget, VideoHostError>;

    /// Push the whole body to the target. The source stream is consumed.
    async fn transfer(
        &self,
        target: &UploadTarget,
        source: UploadSource,
    ) -> Result<(), VideoHostError>;

    async fn get_upload_status(&self, upload_id: &str)
        -> Result<UploadStatusInfo, VideoHostError>;

    async fn get_asset_status(&self, asset_id: &str) -> Result<AssetStatus, VideoHostError>;
}
