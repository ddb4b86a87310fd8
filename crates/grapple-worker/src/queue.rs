//! Job queue: bounded channel drained by a semaphore-limited worker pool.
//!
//! Jobs run detached from whoever submitted them. Nothing awaits their
//! outcome, so the pool is the one place handler errors and panics are logged.
//!
//! Shutdown: [`JobQueue::shutdown`] stops accepting new jobs. Jobs already
//! buffered are still dispatched; in-flight jobs are not awaited.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};

/// A unit of background work.
pub trait Job: Send + 'static {
    /// Short label identifying the job in logs.
    fn label(&self) -> String;
}

#[async_trait]
pub trait JobHandler<J: Job>: Send + Sync + 'static {
    async fn handle(&self, job: J) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is full, please try again later")]
    Full,

    #[error("Job queue is shut down")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    pub queue_size: usize,
    pub max_concurrent: usize,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            max_concurrent: 4,
        }
    }
}

pub struct JobQueue<J: Job> {
    tx: mpsc::Sender<J>,
    shutdown_tx: mpsc::Sender<()>,
}

impl<J: Job> Clone for JobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

impl<J: Job> JobQueue<J> {
    /// Create the queue and spawn its worker pool. Must be called within a
    /// Tokio runtime.
    pub fn new(handler: Arc<dyn JobHandler<J>>, config: JobQueueConfig) -> Self {
        let queue_size = config.queue_size.max(1);
        let max_concurrent = config.max_concurrent.max(1);

        let (tx, rx) = mpsc::channel(queue_size);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::worker_pool(rx, shutdown_rx, handler, max_concurrent).await;
        });

        tracing::info!(
            queue_size = queue_size,
            max_concurrent = max_concurrent,
            "Job queue initialized with bounded channel"
        );

        Self { tx, shutdown_tx }
    }

    /// Enqueue without waiting. Fails with [`QueueError::Full`] when the
    /// buffer is at capacity and [`QueueError::Closed`] after shutdown.
    #[tracing::instrument(skip(self, job), fields(job = %job.label()))]
    pub fn submit(&self, job: J) -> Result<(), QueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => {
                tracing::warn!("Job queue is full, rejecting job");
                QueueError::Full
            }
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn shutdown(&self) {
        tracing::info!("Initiating job queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<J>,
        mut shutdown_rx: mpsc::Receiver<()>,
        handler: Arc<dyn JobHandler<J>>,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut draining = false;

        loop {
            let job = tokio::select! {
                _ = shutdown_rx.recv(), if !draining => {
                    tracing::info!("Job queue shutting down, draining buffered jobs");
                    rx.close();
                    draining = true;
                    continue;
                }
                job = rx.recv() => job,
            };

            let Some(job) = job else {
                break;
            };

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let handler = handler.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::run_job(handler, job).await;
            });
        }

        tracing::info!("Job queue worker pool stopped");
    }

    /// Runs the handler on its own task so a panic is observed here as a
    /// `JoinError` instead of vanishing with the task.
    async fn run_job(handler: Arc<dyn JobHandler<J>>, job: J) {
        let label = job.label();
        let start = std::time::Instant::now();

        let outcome = tokio::spawn(async move { handler.handle(job).await }).await;

        match outcome {
            Ok(Ok(())) => {
                tracing::debug!(
                    job = %label,
                    duration_ms = start.elapsed().as_millis(),
                    "Job completed"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(job = %label, error = %e, "Job processing failed");
            }
            Err(e) if e.is_panic() => {
                tracing::error!(job = %label, "Job panicked");
            }
            Err(e) => {
                tracing::error!(job = %label, error = %e, "Job task was cancelled");
            }
        }
    }
}
