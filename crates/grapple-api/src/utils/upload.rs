//! Multipart parsing for the video upload form.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use grapple_core::models::UploadMetadata;
use grapple_core::AppError;
use grapple_processing::{StagedFile, UploadIntake};

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Everything the form carried: the staged file part (if any) and the raw
/// metadata. Required-field checks are left to intake.
pub struct UploadForm {
    pub file: Option<StagedFile>,
    pub metadata: UploadMetadata,
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::InvalidInput(format!("{}: {}", context, err.body_text()))
    }
}

/// Trimmed text value; blank parts count as absent.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_thumbnail_time(value: Option<String>) -> Result<Option<f64>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Ok(Some(seconds)),
        _ => Err(AppError::InvalidInput(format!(
            "thumbnailTime must be a number of seconds, got '{}'",
            value
        ))),
    }
}

/// Stream the file part into a staged temp file, enforcing the size limit
/// chunk by chunk.
async fn stage_field(intake: &UploadIntake, mut field: Field<'_>) -> Result<StagedFile, AppError> {
    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let mut writer = intake.stage_file(&content_type)?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error("Failed to read file data", e))?
    {
        writer.write_chunk(&chunk).await?;
    }
    Ok(writer.finish().await?)
}

/// Read the whole form. Only one part named `file` is accepted; unknown parts
/// are ignored.
pub async fn read_upload_form(
    mut multipart: Multipart,
    intake: &UploadIntake,
) -> Result<UploadForm, AppError> {
    let mut file: Option<StagedFile> = None;
    let mut metadata = UploadMetadata::default();
    let mut thumbnail_time: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart", e))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == FILE_FIELD {
            if file.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            file = Some(stage_field(intake, field).await?);
            continue;
        }

        let slot = match field_name.as_str() {
            "title" => &mut metadata.title,
            "position" => &mut metadata.position,
            "userId" => &mut metadata.user_id,
            "description" => &mut metadata.description,
            "thumbnailTime" => &mut thumbnail_time,
            _ => {
                tracing::debug!(field = %field_name, "Ignoring unknown multipart field");
                continue;
            }
        };
        let text = field
            .text()
            .await
            .map_err(|e| multipart_error("Failed to read form field", e))?;
        *slot = non_blank(text);
    }

    metadata.thumbnail_time = parse_thumbnail_time(thumbnail_time)?;

    Ok(UploadForm { file, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_absent() {
        assert_eq!(non_blank("  ".to_string()), None);
        assert_eq!(non_blank(" Armbar ".to_string()), Some("Armbar".to_string()));
    }

    #[test]
    fn test_thumbnail_time_parsing() {
        assert_eq!(parse_thumbnail_time(None).unwrap(), None);
        assert_eq!(parse_thumbnail_time(Some("12.5".into())).unwrap(), Some(12.5));
        assert!(parse_thumbnail_time(Some("soon".into())).is_err());
        assert!(parse_thumbnail_time(Some("NaN".into())).is_err());
    }
}
