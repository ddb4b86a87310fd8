//! Spooling of incoming upload bodies to disk.
//!
//! The request handler writes the file part chunk by chunk into a temp file so
//! the response can go out before the transfer to the video host starts. The
//! temp file is removed when the [`StagedFile`] (or the path guard returned by
//! [`StagedFile::into_upload_source`]) is dropped.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io;
use std::path::Path;

use grapple_core::AppError;
use grapple_video::UploadSource;
use tempfile::{Builder, NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

const TEMP_PREFIX: &str = "grapple-upload-";

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("File exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to stage file: {0}")]
    Io(#[from] io::Error),
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StagingError::Io(e) => AppError::InternalWithSource {
                message: "Failed to stage upload".to_string(),
                source: e.into(),
            },
        }
    }
}

pub struct StagedFileWriter {
    temp: NamedTempFile,
    writer: tokio::fs::File,
    content_type: String,
    written: u64,
    limit: u64,
}

impl StagedFileWriter {
    /// Open a temp file in `dir` (system temp dir when `None`).
    pub fn new(
        dir: Option<&Path>,
        content_type: impl Into<String>,
        limit: u64,
    ) -> Result<Self, StagingError> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX);
        let temp = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let writer = tokio::fs::File::from_std(temp.as_file().try_clone()?);

        Ok(Self {
            temp,
            writer,
            content_type: content_type.into(),
            written: 0,
            limit,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk, refusing it if the total would pass the size limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(StagingError::TooLarge { limit: self.limit });
        }
        self.writer.write_all(chunk).await?;
        self.written = next;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StagedFile, StagingError> {
        self.writer.flush().await?;

        tracing::debug!(
            path = %self.temp.path().display(),
            size = self.written,
            content_type = %self.content_type,
            "Staged upload body"
        );

        Ok(StagedFile {
            temp: self.temp,
            content_type: self.content_type,
            size: self.written,
        })
    }
}

/// A fully received upload body waiting on disk for the pipeline.
pub struct StagedFile {
    temp: NamedTempFile,
    content_type: String,
    size: u64,
}

impl Debug for StagedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StagedFile")
            .field("path", &self.temp.path())
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish()
    }
}

impl StagedFile {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Turn the staged body into a single-pass stream for the host. The
    /// returned [`TempPath`] must outlive the transfer; dropping it deletes the file.
    pub fn into_upload_source(self) -> Result<(UploadSource, TempPath), io::Error> {
        let file = self.temp.reopen()?;
        let source = UploadSource {
            stream: Box::pin(ReaderStream::new(tokio::fs::File::from_std(file))),
            content_type: self.content_type,
            content_length: Some(self.size),
        };
        Ok((source, self.temp.into_temp_path()))
    }
}
