#[derive(Debug, thiserror::Error)]
pub enum VideoHostError {
    #[error("Video host request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the host or the upload target.
    #[error("Video host returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected video host response: {0}")]
    InvalidResponse(String),
}

impl VideoHostError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VideoHostError::Status { status, .. } => Some(*status),
            VideoHostError::Http(err) => err.status().map(|s| s.as_u16()),
            VideoHostError::InvalidResponse(_) => None,
        }
    }
}
