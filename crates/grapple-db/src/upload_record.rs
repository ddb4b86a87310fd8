use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grapple_core::models::{NewUploadRecord, UploadRecord, UploadRecordPatch};
use grapple_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::UploadRecordStore;

/// Repository for upload records
#[derive(Clone)]
pub struct UploadRecordRepository {
    pool: PgPool,
}

impl UploadRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRecordStore for UploadRecordRepository {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "postgresql",
        db.table = "upload_records",
        db.operation = "insert",
        user_id = %record.user_id
    ))]
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError> {
        let id = Uuid::new_v4();

        let row = sqlx::query_as::<_, UploadRecord>(
            r#"
            INSERT INTO upload_records (
                id, status, title, position, user_id, description, thumbnail_time
            )
            VALUES ($1, 'uploading', $2, $3, $4, $5, $6)
            RETURNING id, status, title, position, user_id, description,
                      thumbnail_time, playback_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.position)
        .bind(&record.user_id)
        .bind(&record.description)
        .bind(record.thumbnail_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "upload_records",
        db.operation = "select"
    ))]
    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError> {
        let row = sqlx::query_as::<_, UploadRecord>(
            r#"
            SELECT id, status, title, position, user_id, description,
                   thumbnail_time, playback_id, created_at, updated_at
            FROM upload_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, patch), fields(
        db.system = "postgresql",
        db.table = "upload_records",
        db.operation = "update",
        status = %patch.status()
    ))]
    async fn update(&self, id: Uuid, patch: &UploadRecordPatch) -> Result<bool, AppError> {
        // Guarded on the current status so a terminal record is never rewritten.
        let result = sqlx::query(
            r#"
            UPDATE upload_records
            SET status = $2,
                playback_id = COALESCE($3, playback_id),
                thumbnail_time = COALESCE($4, thumbnail_time),
                updated_at = NOW()
            WHERE id = $1 AND status = 'uploading'
            "#,
        )
        .bind(id)
        .bind(patch.status())
        .bind(patch.playback_id())
        .bind(patch.thumbnail_time())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "upload_records",
        db.operation = "update"
    ))]
    async fn fail_stale_uploads(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE upload_records
            SET status = 'error', updated_at = NOW()
            WHERE status = 'uploading' AND created_at < $1
            "#,
        )
        .bind(older_than)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
