//! Completion-poll stage.
//!
//! Each attempt asks for the upload's asset id and, once there is one, for the
//! asset's playback ids. A failed query counts as "not ready yet" and only
//! consumes budget; the stage fails only when the budget runs out.

use grapple_core::UploadError;
use grapple_video::VideoHost;
use grapple_worker::{RetryError, RetryPolicy};

#[tracing::instrument(skip(host, policy), fields(max_attempts = policy.max_attempts))]
pub async fn await_playback_id(
    host: &dyn VideoHost,
    upload_id: &str,
    policy: &RetryPolicy,
) -> Result<String, UploadError> {
    let polled = policy
        .poll_until(|attempt| poll_once(host, upload_id, attempt))
        .await
        .map_err(|e| match e {
            RetryError::Exhausted { attempts } => UploadError::PollTimeout { attempts },
        })?;

    tracing::info!(
        attempts = polled.attempts,
        playback_id = %polled.value,
        "Playback id available"
    );
    Ok(polled.value)
}

async fn poll_once(host: &dyn VideoHost, upload_id: &str, attempt: u32) -> Option<String> {
    let asset_id = match host.get_upload_status(upload_id).await {
        Ok(status) => status.asset_id?,
        Err(e) => {
            tracing::warn!(attempt, error = %e, "Upload status query failed");
            return None;
        }
    };

    match host.get_asset_status(&asset_id).await {
        Ok(asset) => {
            let playback_id = asset.first_playback_id().map(str::to_string);
            if playback_id.is_none() {
                tracing::debug!(attempt, asset_id = %asset_id, "Asset has no playback id yet");
            }
            playback_id
        }
        Err(e) => {
            tracing::warn!(attempt, asset_id = %asset_id, error = %e, "Asset status query failed");
            None
        }
    }
}
