use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

/// Single-pass byte stream of the file being uploaded.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync>>;

/// One-time upload destination issued by the host. Lives only for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub url: String,
    pub upload_id: String,
}

/// The file body handed to [`crate::VideoHost::transfer`].
pub struct UploadSource {
    pub stream: ByteStream,
    pub content_type: String,
    /// Sent as `Content-Length` when known; otherwise the body is chunked.
    pub content_length: Option<u64>,
}

impl UploadSource {
    pub fn from_bytes(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let content_length = Some(bytes.len() as u64);
        Self {
            stream: Box::pin(futures::stream::iter(vec![Ok(bytes)])),
            content_type: content_type.into(),
            content_length,
        }
    }
}

impl Debug for UploadSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadSource")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStatusInfo {
    /// Set once the host has created an asset from the uploaded bytes.
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStatus {
    pub playback_ids: Vec<String>,
}

impl AssetStatus {
    pub fn first_playback_id(&self) -> Option<&str> {
        self.playback_ids.first().map(String::as_str)
    }
}
