//! Scripted in-process [`VideoHost`] for pipeline tests.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;

use crate::error::VideoHostError;
use crate::host::VideoHost;
use crate::types::{AssetStatus, UploadSource, UploadStatusInfo, UploadTarget};

const ASSET_ID: &str = "asset_fake";

#[derive(Debug, Default)]
pub struct FakeVideoHost {
    create_status: Option<u16>,
    transfer_status: Option<u16>,
    /// Upload-status attempt (1-based) from which the asset is reported.
    ready_on_attempt: Option<u32>,
    transient_errors: u32,
    playback_id: String,

    upload_status_calls: AtomicU32,
    asset_status_calls: AtomicU32,
    transferred_bytes: AtomicU64,
    transferred_content_type: Mutex<Option<String>>,
}

impl FakeVideoHost {
    /// Host that reports the asset and `playback_id` on the first poll.
    pub fn ready(playback_id: &str) -> Self {
        Self {
            ready_on_attempt: Some(1),
            playback_id: playback_id.to_string(),
            ..Self::default()
        }
    }

    /// Host whose processing never finishes.
    pub fn never_ready() -> Self {
        Self::default()
    }

    pub fn ready_on_attempt(mut self, attempt: u32) -> Self {
        self.ready_on_attempt = Some(attempt);
        self
    }

    /// Target creation answers with this non-2xx status.
    pub fn failing_create(mut self, status: u16) -> Self {
        self.create_status = Some(status);
        self
    }

    /// The byte transfer answers with this non-2xx status.
    pub fn failing_transfer(mut self, status: u16) -> Self {
        self.transfer_status = Some(status);
        self
    }

    /// The first `count` upload-status queries fail with a 503.
    pub fn with_transient_errors(mut self, count: u32) -> Self {
        self.transient_errors = count;
        self
    }

    pub fn upload_status_calls(&self) -> u32 {
        self.upload_status_calls.load(Ordering::SeqCst)
    }

    pub fn asset_status_calls(&self) -> u32 {
        self.asset_status_calls.load(Ordering::SeqCst)
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::SeqCst)
    }

    pub fn transferred_content_type(&self) -> Option<String> {
        self.transferred_content_type.lock().unwrap().clone()
    }
}

fn rejected(status: u16) -> VideoHostError {
    VideoHostError::Status {
        status,
        body: "scripted failure".to_string(),
    }
}

#[async_trait]
impl VideoHost for FakeVideoHost {
    async fn create_upload_target(&self) -> Result<UploadTarget, VideoHostError> {
        if let Some(status) = self.create_status {
            return Err(rejected(status));
        }
        Ok(UploadTarget {
            url: "https://storage.fake/upload/1".to_string(),
            upload_id: "upload_fake".to_string(),
        })
    }

    async fn transfer(
        &self,
        _target: &UploadTarget,
        source: UploadSource,
    ) -> Result<(), VideoHostError> {
        let chunks: Vec<Bytes> = source
            .stream
            .try_collect()
            .await
            .map_err(|e| VideoHostError::InvalidResponse(e.to_string()))?;
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        self.transferred_bytes.store(total as u64, Ordering::SeqCst);
        *self.transferred_content_type.lock().unwrap() = Some(source.content_type);

        match self.transfer_status {
            Some(status) => Err(rejected(status)),
            None => Ok(()),
        }
    }

    async fn get_upload_status(
        &self,
        _upload_id: &str,
    ) -> Result<UploadStatusInfo, VideoHostError> {
        let attempt = self.upload_status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.transient_errors {
            return Err(rejected(503));
        }
        let ready = self.ready_on_attempt.is_some_and(|k| attempt >= k);
        Ok(UploadStatusInfo {
            asset_id: ready.then(|| ASSET_ID.to_string()),
        })
    }

    async fn get_asset_status(&self, _asset_id: &str) -> Result<AssetStatus, VideoHostError> {
        self.asset_status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AssetStatus {
            playback_ids: vec![self.playback_id.clone()],
        })
    }
}
