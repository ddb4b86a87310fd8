//! Background execution for the upload pipeline.
//!
//! - [`queue`]: bounded job queue drained by a semaphore-limited worker pool.
//! - [`retry`]: bounded polling/retry policy with fixed or exponential delays.

pub mod queue;
pub mod retry;

pub use queue::{Job, JobHandler, JobQueue, JobQueueConfig, QueueError};
pub use retry::{Backoff, Polled, RetryError, RetryPolicy};
