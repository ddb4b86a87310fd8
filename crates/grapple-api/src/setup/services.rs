//! Wiring of the upload pipeline: store, video host, worker queue, intake and
//! the stale-upload sweeper.

use crate::state::{AppState, BackgroundTasks, UploadState};
use anyhow::{Context, Result};
use grapple_core::Config;
use grapple_db::{UploadRecordRepository, UploadRecordStore};
use grapple_processing::{IntakeLimits, StaleUploadSweeper, UploadIntake, UploadJob, UploadPipeline};
use grapple_video::{MuxClient, VideoHost};
use grapple_worker::{JobQueue, JobQueueConfig, RetryPolicy};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Build production state on top of a connected pool.
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let store: Arc<dyn UploadRecordStore> = Arc::new(UploadRecordRepository::new(pool));

    let host = MuxClient::from_config(config.video_host())
        .context("Failed to build video host client")?
        .map(|client| Arc::new(client) as Arc<dyn VideoHost>);

    if host.is_none() {
        tracing::warn!(
            "MUX_TOKEN_ID/MUX_TOKEN_SECRET not set; uploads will be accepted but end in error"
        );
    }

    Ok(build_state(config, store, host))
}

/// Assemble the state from an arbitrary store and host. Must run inside a
/// Tokio runtime since it spawns the worker pool and the sweeper.
pub fn build_state(
    config: &Config,
    store: Arc<dyn UploadRecordStore>,
    host: Option<Arc<dyn VideoHost>>,
) -> Arc<AppState> {
    let pipeline_config = config.pipeline();

    let poll_policy = RetryPolicy::fixed(
        pipeline_config.poll_max_attempts,
        pipeline_config.poll_interval(),
    );
    let pipeline = UploadPipeline::new(store.clone(), host, poll_policy);

    let queue: JobQueue<UploadJob> = JobQueue::new(
        Arc::new(pipeline),
        JobQueueConfig {
            queue_size: pipeline_config.queue_size,
            max_concurrent: pipeline_config.max_concurrent_uploads,
        },
    );

    let intake = UploadIntake::new(
        store.clone(),
        queue.clone(),
        IntakeLimits::from_config(pipeline_config),
    );

    let sweeper = StaleUploadSweeper::start(
        store.clone(),
        Duration::from_secs(pipeline_config.stale_sweep_interval_secs),
        Duration::from_secs(pipeline_config.stale_deadline_secs),
    );

    tracing::info!(
        poll_max_attempts = pipeline_config.poll_max_attempts,
        poll_interval_ms = pipeline_config.poll_interval_ms,
        max_concurrent_uploads = pipeline_config.max_concurrent_uploads,
        "Upload pipeline initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        uploads: UploadState { store, intake },
        background: BackgroundTasks { queue, sweeper },
    })
}
