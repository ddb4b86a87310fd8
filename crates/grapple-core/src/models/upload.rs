use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::upload_error::UploadError;

/// Thumbnail offset (seconds) applied when the caller supplies none, and
/// restored once the host has produced the final asset.
pub const DEFAULT_THUMBNAIL_TIME: f64 = 0.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "upload_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Draft,
    Error,
}

impl UploadStatus {
    /// `uploading` is the only state with outgoing edges.
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Uploading, UploadStatus::Draft)
                | (UploadStatus::Uploading, UploadStatus::Error)
        )
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Draft => write!(f, "draft"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

/// Persisted row tracking one upload's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: Uuid,
    pub status: UploadStatus,
    pub title: String,
    pub position: String,
    pub user_id: String,
    pub description: Option<String>,
    pub thumbnail_time: f64,
    pub playback_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a record about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUploadRecord {
    pub title: String,
    pub position: String,
    pub user_id: String,
    pub description: Option<String>,
    pub thumbnail_time: f64,
}

impl NewUploadRecord {
    /// Materialize the placeholder row in `uploading` state.
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> UploadRecord {
        UploadRecord {
            id,
            status: UploadStatus::Uploading,
            title: self.title,
            position: self.position,
            user_id: self.user_id,
            description: self.description,
            thumbnail_time: self.thumbnail_time,
            playback_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Terminal update for a record. Only constructible as one of the two legal
/// outcomes, so `playback_id` is set exactly when the status is `draft`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecordPatch {
    status: UploadStatus,
    playback_id: Option<String>,
    thumbnail_time: Option<f64>,
}

impl UploadRecordPatch {
    pub fn ready(playback_id: impl Into<String>) -> Self {
        Self {
            status: UploadStatus::Draft,
            playback_id: Some(playback_id.into()),
            thumbnail_time: Some(DEFAULT_THUMBNAIL_TIME),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: UploadStatus::Error,
            playback_id: None,
            thumbnail_time: None,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn playback_id(&self) -> Option<&str> {
        self.playback_id.as_deref()
    }

    pub fn thumbnail_time(&self) -> Option<f64> {
        self.thumbnail_time
    }

    /// Apply the patch in place. Returns `false` and leaves the record untouched
    /// when the record is already terminal.
    pub fn apply_to(&self, record: &mut UploadRecord, now: DateTime<Utc>) -> bool {
        if !record.status.can_transition_to(self.status) {
            return false;
        }
        record.status = self.status;
        if let Some(ref playback_id) = self.playback_id {
            record.playback_id = Some(playback_id.clone());
        }
        if let Some(thumbnail_time) = self.thumbnail_time {
            record.thumbnail_time = thumbnail_time;
        }
        record.updated_at = now;
        true
    }
}

/// Caller-supplied metadata as received, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[validate(required, length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub position: Option<String>,
    #[validate(required, length(min = 1, max = 128))]
    pub user_id: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub thumbnail_time: Option<f64>,
}

impl UploadMetadata {
    pub fn into_new_record(self) -> Result<NewUploadRecord, UploadError> {
        self.validate()?;

        match (self.title, self.position, self.user_id) {
            (Some(title), Some(position), Some(user_id)) => Ok(NewUploadRecord {
                title,
                position,
                user_id,
                description: self.description,
                thumbnail_time: self.thumbnail_time.unwrap_or(DEFAULT_THUMBNAIL_TIME),
            }),
            _ => Err(UploadError::Validation(
                "title, position and userId are required".to_string(),
            )),
        }
    }
}

/// Synchronous intake response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub record_id: Uuid,
    pub status: UploadStatus,
}
