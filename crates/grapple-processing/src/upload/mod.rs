//! Video upload pipeline: intake → target/transfer → completion poll → reconcile.

pub mod intake;
pub mod pipeline;
pub mod poll;
pub mod reconcile;
pub mod staging;
pub mod sweep;
pub mod target;

pub use intake::{IntakeLimits, UploadIntake};
pub use pipeline::{UploadJob, UploadPipeline};
pub use reconcile::ReconcileOutcome;
pub use staging::{StagedFile, StagedFileWriter, StagingError};
pub use sweep::StaleUploadSweeper;
