//! Grapple upload processing.
//!
//! Intake runs on the caller's request and returns as soon as the placeholder
//! record exists. Everything after it (target, transfer, completion polling and
//! reconciliation) runs as an [`upload::UploadJob`] on the worker queue.

pub mod upload;

pub use upload::{
    IntakeLimits, ReconcileOutcome, StagedFile, StagedFileWriter, StaleUploadSweeper,
    StagingError, UploadIntake, UploadJob, UploadPipeline,
};
