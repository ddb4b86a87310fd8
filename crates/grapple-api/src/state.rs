//! Application state shared by every handler.
//!
//! Handlers take `State<Arc<AppState>>` and reach into the sub-state they need.

use grapple_core::Config;
use grapple_db::UploadRecordStore;
use grapple_processing::{StaleUploadSweeper, UploadIntake, UploadJob};
use grapple_worker::JobQueue;
use std::sync::Arc;

/// Upload intake and the record store used for status queries.
#[derive(Clone)]
pub struct UploadState {
    pub store: Arc<dyn UploadRecordStore>,
    pub intake: UploadIntake,
}

/// Long-running workers owned by the process.
pub struct BackgroundTasks {
    pub queue: JobQueue<UploadJob>,
    pub sweeper: Option<StaleUploadSweeper>,
}

impl BackgroundTasks {
    /// Stop accepting pipeline work and stop the sweeper. Runs already in
    /// flight are left to finish on their own tasks.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
        if let Some(sweeper) = &self.sweeper {
            sweeper.shutdown().await;
        }
        tracing::info!("Background workers stopped");
    }
}

pub struct AppState {
    pub config: Config,
    pub uploads: UploadState,
    pub background: BackgroundTasks,
}
