//! The detached part of an upload: target → transfer → poll → reconcile.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use grapple_core::UploadError;
use grapple_db::UploadRecordStore;
use grapple_video::VideoHost;
use grapple_worker::{Job, JobHandler, RetryPolicy};
use uuid::Uuid;

use super::poll::await_playback_id;
use super::reconcile::{reconcile, ReconcileOutcome};
use super::staging::StagedFile;
use super::target::upload_to_host;

/// One pipeline run for a record created by intake.
#[derive(Debug)]
pub struct UploadJob {
    pub record_id: Uuid,
    pub file: StagedFile,
}

impl Job for UploadJob {
    fn label(&self) -> String {
        format!("upload:{}", self.record_id)
    }
}

#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn UploadRecordStore>,
    host: Option<Arc<dyn VideoHost>>,
    poll_policy: RetryPolicy,
}

impl UploadPipeline {
    /// `host` is `None` when no video host credentials are configured; every
    /// run then ends in `error`.
    pub fn new(
        store: Arc<dyn UploadRecordStore>,
        host: Option<Arc<dyn VideoHost>>,
        poll_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            host,
            poll_policy,
        }
    }

    #[tracing::instrument(skip(self, job), fields(record_id = %job.record_id, job.status = tracing::field::Empty))]
    pub async fn run(&self, job: UploadJob) -> ReconcileOutcome {
        let start = Instant::now();
        let record_id = job.record_id;

        let outcome = self.execute(job.file).await;
        match &outcome {
            Ok(playback_id) => {
                tracing::info!(
                    %record_id,
                    playback_id = %playback_id,
                    duration_ms = start.elapsed().as_millis(),
                    "Upload pipeline completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    %record_id,
                    error_kind = e.kind(),
                    error = %e,
                    duration_ms = start.elapsed().as_millis(),
                    "Upload pipeline failed"
                );
            }
        }

        let reconciled = reconcile(self.store.as_ref(), record_id, &outcome).await;
        tracing::Span::current().record("job.status", tracing::field::debug(&reconciled));
        reconciled
    }

    async fn execute(&self, file: StagedFile) -> Result<String, UploadError> {
        let host = self.host.as_deref().ok_or(UploadError::MissingCredentials)?;
        let target = upload_to_host(host, file).await?;
        await_playback_id(host, &target.upload_id, &self.poll_policy).await
    }
}

#[async_trait]
impl JobHandler<UploadJob> for UploadPipeline {
    async fn handle(&self, job: UploadJob) -> anyhow::Result<()> {
        let record_id = job.record_id;
        match self.run(job).await {
            ReconcileOutcome::Stranded => Err(anyhow::anyhow!(
                "Upload record {} left in uploading after failed writes",
                record_id
            )),
            _ => Ok(()),
        }
    }
}
