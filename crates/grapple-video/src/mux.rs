//! Mux Video API client (direct uploads).
//!
//! Flow: `POST /video/v1/uploads` returns a one-time upload URL, the file is
//! `PUT` to that URL, then `GET /video/v1/uploads/{id}` eventually carries an
//! `asset_id` and `GET /video/v1/assets/{id}` its playback ids.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use grapple_core::VideoHostConfig;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::VideoHostError;
use crate::host::VideoHost;
use crate::types::{AssetStatus, UploadSource, UploadStatusInfo, UploadTarget};

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct MuxUpload {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    asset_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct MuxAsset {
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct MuxPlaybackId {
    id: String,
}

#[derive(Clone)]
pub struct MuxClient {
    http_client: Client,
    base_url: String,
    token_id: String,
    token_secret: String,
    playback_policy: String,
    cors_origin: String,
}

impl Debug for MuxClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MuxClient")
            .field("base_url", &self.base_url)
            .field("playback_policy", &self.playback_policy)
            .finish_non_exhaustive()
    }
}

impl MuxClient {
    /// Build a client from configuration. Returns `Ok(None)` when no
    /// credentials are configured.
    pub fn from_config(config: &VideoHostConfig) -> Result<Option<Self>, VideoHostError> {
        let Some((token_id, token_secret)) = config.credentials() else {
            return Ok(None);
        };

        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Some(Self {
            http_client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
            playback_policy: config.playback_policy.clone(),
            cors_origin: config.cors_origin.clone(),
        }))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/video/v1/{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, VideoHostError> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;

        decode_data(ensure_success(response).await?).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, VideoHostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(VideoHostError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_data<T: DeserializeOwned>(response: Response) -> Result<T, VideoHostError> {
    let envelope: DataEnvelope<T> = response
        .json()
        .await
        .map_err(|e| VideoHostError::InvalidResponse(e.to_string()))?;
    Ok(envelope.data)
}

#[async_trait]
impl VideoHost for MuxClient {
    #[tracing::instrument(skip(self))]
    async fn create_upload_target(&self) -> Result<UploadTarget, VideoHostError> {
        let response = self
            .http_client
            .post(self.endpoint("uploads"))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&json!({
                "new_asset_settings": {
                    "playback_policy": [self.playback_policy],
                },
                "cors_origin": self.cors_origin,
            }))
            .send()
            .await?;

        let upload: MuxUpload = decode_data(ensure_success(response).await?).await?;
        let url = upload.url.filter(|u| !u.is_empty()).ok_or_else(|| {
            VideoHostError::InvalidResponse(format!("upload {} has no url", upload.id))
        })?;

        tracing::debug!(upload_id = %upload.id, "Created direct upload");
        Ok(UploadTarget {
            url,
            upload_id: upload.id,
        })
    }

    #[tracing::instrument(skip(self, target, source), fields(
        upload_id = %target.upload_id,
        content_type = %source.content_type,
        content_length = ?source.content_length
    ))]
    async fn transfer(
        &self,
        target: &UploadTarget,
        source: UploadSource,
    ) -> Result<(), VideoHostError> {
        let mut request = self
            .http_client
            .put(&target.url)
            .header(CONTENT_TYPE, source.content_type);
        if let Some(length) = source.content_length {
            request = request.header(CONTENT_LENGTH, length);
        }

        let response = request.body(Body::wrap_stream(source.stream)).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get_upload_status(
        &self,
        upload_id: &str,
    ) -> Result<UploadStatusInfo, VideoHostError> {
        let upload: MuxUpload = self.get_data(&format!("uploads/{}", upload_id)).await?;
        tracing::trace!(
            upload_id = %upload.id,
            status = ?upload.status,
            asset_id = ?upload.asset_id,
            "Fetched upload status"
        );
        Ok(UploadStatusInfo {
            asset_id: upload.asset_id.filter(|id| !id.is_empty()),
        })
    }

    async fn get_asset_status(&self, asset_id: &str) -> Result<AssetStatus, VideoHostError> {
        let asset: MuxAsset = self.get_data(&format!("assets/{}", asset_id)).await?;
        tracing::trace!(
            asset_id = %asset_id,
            status = ?asset.status,
            playback_ids = asset.playback_ids.len(),
            "Fetched asset status"
        );
        Ok(AssetStatus {
            playback_ids: asset.playback_ids.into_iter().map(|p| p.id).collect(),
        })
    }
}
