//! Upload pipeline error taxonomy.
//!
//! Only `Validation` and `Persistence` ever reach a caller synchronously (from
//! intake). Everything raised inside the detached pipeline is logged and folded
//! into the record's `error` status.

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Bad caller input. Raised before any record exists.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The video host rejected the upload target request.
    #[error("Upload target creation failed: {0}")]
    UploadInit(String),

    /// The byte transfer failed or the target rejected it.
    #[error("Upload transfer failed: {0}")]
    UploadTransfer(String),

    /// The polling budget ran out without a playback id.
    #[error("No playback id after {attempts} polling attempts")]
    PollTimeout { attempts: u32 },

    #[error("Persistence error: {0}")]
    Persistence(#[source] AppError),

    #[error("Video host credentials are not configured")]
    MissingCredentials,

    /// The background executor no longer accepts work.
    #[error("Upload queue unavailable: {0}")]
    QueueUnavailable(String),
}

impl UploadError {
    /// Taxonomy name used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "ValidationError",
            UploadError::UploadInit(_) => "UploadInitError",
            UploadError::UploadTransfer(_) => "UploadTransferError",
            UploadError::PollTimeout { .. } => "PollTimeoutError",
            UploadError::Persistence(_) => "PersistenceError",
            UploadError::MissingCredentials => "MissingCredentials",
            UploadError::QueueUnavailable(_) => "QueueUnavailable",
        }
    }
}

impl From<validator::ValidationErrors> for UploadError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| json_field_name(field))
            .collect();
        fields.sort();
        UploadError::Validation(format!("missing or invalid fields: {}", fields.join(", ")))
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(msg) => AppError::InvalidInput(msg),
            UploadError::Persistence(inner) => inner,
            UploadError::QueueUnavailable(msg) => AppError::ServiceUnavailable(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Converts a snake_case struct field into the camelCase name callers send.
fn json_field_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
