//! Reconciliation stage: the single terminal write for a pipeline run.

use grapple_core::models::UploadRecordPatch;
use grapple_core::UploadError;
use grapple_db::UploadRecordStore;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Record moved to `draft` with its playback id.
    Ready,
    /// Record moved to `error`.
    Failed,
    /// Record was no longer `uploading` (already terminal, or gone); nothing written.
    Skipped,
    /// Both the primary and the fallback write failed; record left `uploading`.
    Stranded,
}

/// Write the run's outcome onto the record. On a persistence failure, one
/// fallback write of `status = error` is attempted.
#[tracing::instrument(skip(store, outcome), fields(success = outcome.is_ok()))]
pub async fn reconcile(
    store: &dyn UploadRecordStore,
    record_id: Uuid,
    outcome: &Result<String, UploadError>,
) -> ReconcileOutcome {
    let (patch, applied) = match outcome {
        Ok(playback_id) => (UploadRecordPatch::ready(playback_id), ReconcileOutcome::Ready),
        Err(_) => (UploadRecordPatch::failed(), ReconcileOutcome::Failed),
    };

    let err = match store.update(record_id, &patch).await {
        Ok(true) => return applied,
        Ok(false) => {
            tracing::warn!(%record_id, "Record is not uploading, terminal update skipped");
            return ReconcileOutcome::Skipped;
        }
        Err(e) => e,
    };

    tracing::error!(
        %record_id,
        error = %err,
        "Failed to write upload outcome, falling back to error status"
    );

    match store.update(record_id, &UploadRecordPatch::failed()).await {
        Ok(true) => ReconcileOutcome::Failed,
        Ok(false) => ReconcileOutcome::Skipped,
        Err(fallback_err) => {
            tracing::error!(
                %record_id,
                error = %fallback_err,
                "Fallback error write failed, record left in uploading"
            );
            ReconcileOutcome::Stranded
        }
    }
}
