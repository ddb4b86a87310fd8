//! Intake stage: validate, create the placeholder record, hand off to the queue.

use std::path::PathBuf;
use std::sync::Arc;

use grapple_core::models::{UploadAccepted, UploadMetadata, UploadRecordPatch, UploadStatus};
use grapple_core::{AppError, UploadError, UploadPipelineConfig};
use grapple_db::UploadRecordStore;
use grapple_worker::JobQueue;

use super::pipeline::UploadJob;
use super::staging::{StagedFile, StagedFileWriter};

#[derive(Debug, Clone)]
pub struct IntakeLimits {
    pub max_file_size: u64,
    pub allowed_content_types: Vec<String>,
    pub staging_dir: Option<PathBuf>,
}

impl IntakeLimits {
    pub fn from_config(config: &UploadPipelineConfig) -> Self {
        Self {
            max_file_size: config.max_video_size_bytes as u64,
            allowed_content_types: config.video_allowed_content_types.clone(),
            staging_dir: config.staging_dir.as_ref().map(PathBuf::from),
        }
    }

    pub fn check_content_type(&self, content_type: &str) -> Result<(), UploadError> {
        // Ignore parameters such as "; codecs=...".
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if self.allowed_content_types.iter().any(|t| *t == essence) {
            Ok(())
        } else {
            Err(UploadError::Validation(format!(
                "unsupported content type: {} (allowed: {})",
                content_type,
                self.allowed_content_types.join(", ")
            )))
        }
    }
}

#[derive(Clone)]
pub struct UploadIntake {
    store: Arc<dyn UploadRecordStore>,
    queue: JobQueue<UploadJob>,
    limits: IntakeLimits,
}

impl UploadIntake {
    pub fn new(
        store: Arc<dyn UploadRecordStore>,
        queue: JobQueue<UploadJob>,
        limits: IntakeLimits,
    ) -> Self {
        Self {
            store,
            queue,
            limits,
        }
    }

    /// Open a staging writer for an incoming file part. The content type is
    /// checked here so a disallowed file is refused before any byte is read.
    pub fn stage_file(&self, content_type: &str) -> Result<StagedFileWriter, AppError> {
        self.limits.check_content_type(content_type)?;
        let writer = StagedFileWriter::new(
            self.limits.staging_dir.as_deref(),
            content_type,
            self.limits.max_file_size,
        )?;
        Ok(writer)
    }

    /// Validate the request, create the record in `uploading` and enqueue the
    /// rest of the pipeline. Returns without waiting on the video host.
    #[tracing::instrument(skip(self, file, metadata), fields(
        user_id = ?metadata.user_id,
        size = file.as_ref().map(|f| f.size())
    ))]
    pub async fn start_upload(
        &self,
        file: Option<StagedFile>,
        metadata: UploadMetadata,
    ) -> Result<UploadAccepted, UploadError> {
        let file = file.ok_or_else(|| UploadError::Validation("file is required".to_string()))?;
        if file.size() == 0 {
            return Err(UploadError::Validation("file is empty".to_string()));
        }
        self.limits.check_content_type(file.content_type())?;

        let new_record = metadata.into_new_record()?;

        let record = self
            .store
            .create(new_record)
            .await
            .map_err(UploadError::Persistence)?;
        let record_id = record.id;

        tracing::info!(%record_id, "Upload record created, enqueuing pipeline");

        // Never wait for queue space: a full or closed queue fails the record now.
        if let Err(e) = self.queue.submit(UploadJob { record_id, file }) {
            tracing::error!(%record_id, error = %e, "Failed to enqueue upload pipeline");
            if let Err(update_err) = self
                .store
                .update(record_id, &UploadRecordPatch::failed())
                .await
            {
                tracing::error!(
                    %record_id,
                    error = %update_err,
                    "Failed to mark unqueued upload as error"
                );
            }
            return Err(UploadError::QueueUnavailable(e.to_string()));
        }

        Ok(UploadAccepted {
            record_id,
            status: UploadStatus::Uploading,
        })
    }
}
