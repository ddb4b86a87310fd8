//! Grapple Core Library
//!
//! Domain models, error types and configuration shared by every grapple crate:
//! the upload record and its status machine, the pipeline error taxonomy, and
//! the environment-driven service configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod upload_error;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadPipelineConfig, UploadServiceConfig, VideoHostConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use upload_error::UploadError;
