use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grapple_core::models::{NewUploadRecord, UploadRecord, UploadRecordPatch};
use grapple_core::AppError;
use uuid::Uuid;

#[async_trait]
pub trait UploadRecordStore: Send + Sync {
    /// Insert a new record in `uploading` state and return it with its id.
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError>;

    /// Apply a terminal patch. Returns `false` when no `uploading` record with
    /// this id exists (absent, or already terminal).
    async fn update(&self, id: Uuid, patch: &UploadRecordPatch) -> Result<bool, AppError>;

    /// Move every record still `uploading` that was created before `older_than`
    /// to `error`. Returns how many records were failed.
    async fn fail_stale_uploads(&self, older_than: DateTime<Utc>) -> Result<u64, AppError>;

    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), AppError>;
}
