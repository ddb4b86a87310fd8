use std::sync::Arc;
use std::time::Duration;

use grapple_core::models::{UploadMetadata, UploadRecord, UploadStatus};
use grapple_core::UploadError;
use grapple_db::test_helpers::InMemoryUploadRecordStore;
use grapple_db::UploadRecordStore;
use grapple_processing::{
    IntakeLimits, ReconcileOutcome, StagedFile, StagedFileWriter, UploadIntake, UploadJob,
    UploadPipeline,
};
use grapple_video::test_helpers::FakeVideoHost;
use grapple_video::VideoHost;
use grapple_worker::{JobQueue, JobQueueConfig, RetryPolicy};
use uuid::Uuid;

const MB: usize = 1024 * 1024;

fn limits() -> IntakeLimits {
    IntakeLimits {
        max_file_size: 64 * MB as u64,
        allowed_content_types: vec!["video/mp4".to_string(), "video/quicktime".to_string()],
        staging_dir: None,
    }
}

fn metadata() -> UploadMetadata {
    UploadMetadata {
        title: Some("Armbar".to_string()),
        position: Some("Guard".to_string()),
        user_id: Some("u1".to_string()),
        description: None,
        thumbnail_time: None,
    }
}

async fn staged(len: usize, content_type: &str) -> StagedFile {
    let mut writer = StagedFileWriter::new(None, content_type, 64 * MB as u64).unwrap();
    let chunk = vec![7u8; MB.min(len.max(1))];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(chunk.len());
        writer.write_chunk(&chunk[..n]).await.unwrap();
        remaining -= n;
    }
    writer.finish().await.unwrap()
}

struct Harness {
    store: InMemoryUploadRecordStore,
    host: Arc<FakeVideoHost>,
    intake: UploadIntake,
    queue: JobQueue<UploadJob>,
}

fn harness(host: FakeVideoHost) -> Harness {
    harness_with(
        host,
        RetryPolicy::fixed(20, Duration::from_millis(1)),
        JobQueueConfig::default(),
    )
}

fn harness_with(host: FakeVideoHost, poll_policy: RetryPolicy, queue_config: JobQueueConfig) -> Harness {
    let store = InMemoryUploadRecordStore::new();
    let host = Arc::new(host);
    let pipeline = UploadPipeline::new(
        Arc::new(store.clone()),
        Some(host.clone() as Arc<dyn VideoHost>),
        poll_policy,
    );
    let queue: JobQueue<UploadJob> = JobQueue::new(Arc::new(pipeline), queue_config);
    let intake = UploadIntake::new(Arc::new(store.clone()), queue.clone(), limits());
    Harness {
        store,
        host,
        intake,
        queue,
    }
}

async fn wait_for_terminal(store: &InMemoryUploadRecordStore, id: Uuid) -> UploadRecord {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let record = store.get(id).await.unwrap().expect("record exists");
            if record.status != UploadStatus::Uploading {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pipeline should reach a terminal state")
}

#[tokio::test]
async fn test_armbar_upload_reaches_draft() {
    let h = harness(FakeVideoHost::ready("pb_123"));

    let accepted = h
        .intake
        .start_upload(Some(staged(10 * MB, "video/mp4").await), metadata())
        .await
        .unwrap();
    assert_eq!(accepted.status, UploadStatus::Uploading);

    let record = wait_for_terminal(&h.store, accepted.record_id).await;
    assert_eq!(record.status, UploadStatus::Draft);
    assert_eq!(record.playback_id.as_deref(), Some("pb_123"));
    assert_eq!(record.thumbnail_time, 0.0);
    assert_eq!(record.title, "Armbar");

    assert_eq!(h.host.transferred_bytes(), 10 * MB as u64);
    assert_eq!(h.host.transferred_content_type().as_deref(), Some("video/mp4"));
    assert_eq!(h.host.upload_status_calls(), 1);
}

#[tokio::test]
async fn test_record_is_uploading_when_intake_returns() {
    let h = harness(FakeVideoHost::never_ready());

    let accepted = h
        .intake
        .start_upload(Some(staged(1024, "video/mp4").await), metadata())
        .await
        .unwrap();

    let record = h.store.get(accepted.record_id).await.unwrap().unwrap();
    assert_eq!(record.status, UploadStatus::Uploading);
    assert_eq!(record.playback_id, None);
}

#[tokio::test]
async fn test_target_creation_failure_ends_in_error() {
    let h = harness(FakeVideoHost::ready("pb_123").failing_create(500));

    let accepted = h
        .intake
        .start_upload(Some(staged(1024, "video/mp4").await), metadata())
        .await
        .unwrap();

    let record = wait_for_terminal(&h.store, accepted.record_id).await;
    assert_eq!(record.status, UploadStatus::Error);
    assert_eq!(record.playback_id, None);
    assert_eq!(h.host.transferred_bytes(), 0);
    assert_eq!(h.host.upload_status_calls(), 0);
}

#[tokio::test]
async fn test_transfer_failure_ends_in_error_without_polling() {
    let h = harness(FakeVideoHost::ready("pb_123").failing_transfer(403));

    let accepted = h
        .intake
        .start_upload(Some(staged(2048, "video/mp4").await), metadata())
        .await
        .unwrap();

    let record = wait_for_terminal(&h.store, accepted.record_id).await;
    assert_eq!(record.status, UploadStatus::Error);
    assert_eq!(h.host.upload_status_calls(), 0);
}

#[tokio::test]
async fn test_missing_required_metadata_creates_no_record() {
    let h = harness(FakeVideoHost::ready("pb_123"));

    for strip in ["title", "position", "userId"] {
        let mut meta = metadata();
        match strip {
            "title" => meta.title = None,
            "position" => meta.position = None,
            _ => meta.user_id = None,
        }
        let err = h
            .intake
            .start_upload(Some(staged(16, "video/mp4").await), meta)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)), "{strip}: {err}");
        assert!(err.to_string().contains(strip), "{strip}: {err}");
    }

    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let h = harness(FakeVideoHost::ready("pb_123"));
    let mut meta = metadata();
    meta.title = Some(String::new());

    let err = h
        .intake
        .start_upload(Some(staged(16, "video/mp4").await), meta)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Validation(_)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_missing_or_empty_file_is_rejected() {
    let h = harness(FakeVideoHost::ready("pb_123"));

    let err = h.intake.start_upload(None, metadata()).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: file is required");

    let err = h
        .intake
        .start_upload(Some(staged(0, "video/mp4").await), metadata())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation error: file is empty");

    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_unsupported_content_type_is_rejected() {
    let h = harness(FakeVideoHost::ready("pb_123"));

    assert!(h.intake.stage_file("image/png").is_err());
    assert!(h.intake.stage_file("video/mp4; codecs=avc1").is_ok());

    let err = h
        .intake
        .start_upload(Some(staged(16, "application/pdf").await), metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Validation(_)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_store_failure_on_create_is_persistence_error() {
    let h = harness(FakeVideoHost::ready("pb_123"));
    h.store.fail_creates(true);

    let err = h
        .intake
        .start_upload(Some(staged(16, "video/mp4").await), metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Persistence(_)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_closed_queue_marks_record_error() {
    let h = harness(FakeVideoHost::ready("pb_123"));
    h.queue.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.queue.is_closed() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    let err = h
        .intake
        .start_upload(Some(staged(16, "video/mp4").await), metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::QueueUnavailable(_)));

    let records = h.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, UploadStatus::Error);
}

#[tokio::test]
async fn test_full_queue_fails_fast_and_marks_record_error() {
    // Each run polls a host that never finishes, so the single worker stays busy.
    let h = harness_with(
        FakeVideoHost::never_ready(),
        RetryPolicy::fixed(20, Duration::from_secs(60)),
        JobQueueConfig {
            queue_size: 1,
            max_concurrent: 1,
        },
    );

    // First run occupies the worker, the second waits for a permit, the third
    // fills the buffer.
    let mut accepted = Vec::new();
    for _ in 0..3 {
        let upload = h
            .intake
            .start_upload(Some(staged(16, "video/mp4").await), metadata())
            .await
            .unwrap();
        accepted.push(upload.record_id);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let err = tokio::time::timeout(
        Duration::from_millis(500),
        h.intake
            .start_upload(Some(staged(16, "video/mp4").await), metadata()),
    )
    .await
    .expect("intake must not wait for queue space")
    .unwrap_err();
    assert!(matches!(err, UploadError::QueueUnavailable(_)));

    let records = h.store.all();
    assert_eq!(records.len(), 4);
    for record in records {
        let expected = if accepted.contains(&record.id) {
            UploadStatus::Uploading
        } else {
            UploadStatus::Error
        };
        assert_eq!(record.status, expected);
    }
}

mod pipeline_runs {
    use super::*;
    use grapple_core::models::NewUploadRecord;
    use tokio::time::Instant;

    async fn seeded(store: &InMemoryUploadRecordStore) -> Uuid {
        store
            .create(NewUploadRecord {
                title: "Armbar".into(),
                position: "Guard".into(),
                user_id: "u1".into(),
                description: None,
                thumbnail_time: 3.0,
            })
            .await
            .unwrap()
            .id
    }

    fn pipeline(
        store: &InMemoryUploadRecordStore,
        host: Option<Arc<FakeVideoHost>>,
    ) -> UploadPipeline {
        UploadPipeline::new(
            Arc::new(store.clone()),
            host.map(|h| h as Arc<dyn VideoHost>),
            RetryPolicy::fixed(20, Duration::from_secs(1)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_exhaustion_ends_in_error() {
        let store = InMemoryUploadRecordStore::new();
        let host = Arc::new(FakeVideoHost::never_ready());
        let record_id = seeded(&store).await;
        let file = staged(512, "video/mp4").await;

        let start = Instant::now();
        let outcome = pipeline(&store, Some(host.clone()))
            .run(UploadJob { record_id, file })
            .await;

        assert_eq!(outcome, ReconcileOutcome::Failed);
        assert_eq!(host.upload_status_calls(), 20);
        assert_eq!(host.asset_status_calls(), 0);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(19) && elapsed < Duration::from_secs(20));

        let record = store.get(record_id).await.unwrap().unwrap();
        assert_eq!(record.status, UploadStatus::Error);
        assert_eq!(record.playback_id, None);
        assert_eq!(record.thumbnail_time, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_at_attempt_k() {
        let store = InMemoryUploadRecordStore::new();
        let host = Arc::new(FakeVideoHost::ready("pb_k").ready_on_attempt(5));
        let record_id = seeded(&store).await;
        let file = staged(512, "video/mp4").await;

        let outcome = pipeline(&store, Some(host.clone()))
            .run(UploadJob { record_id, file })
            .await;

        assert_eq!(outcome, ReconcileOutcome::Ready);
        assert_eq!(host.upload_status_calls(), 5);
        assert_eq!(host.asset_status_calls(), 1);

        let record = store.get(record_id).await.unwrap().unwrap();
        assert_eq!(record.status, UploadStatus::Draft);
        assert_eq!(record.playback_id.as_deref(), Some("pb_k"));
        assert_eq!(record.thumbnail_time, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_errors_consume_budget_only() {
        let store = InMemoryUploadRecordStore::new();
        let host = Arc::new(FakeVideoHost::ready("pb_retry").with_transient_errors(3));
        let record_id = seeded(&store).await;
        let file = staged(512, "video/mp4").await;

        let outcome = pipeline(&store, Some(host.clone()))
            .run(UploadJob { record_id, file })
            .await;

        assert_eq!(outcome, ReconcileOutcome::Ready);
        assert_eq!(host.upload_status_calls(), 4);
    }

    #[tokio::test]
    async fn test_missing_credentials_ends_in_error() {
        let store = InMemoryUploadRecordStore::new();
        let record_id = seeded(&store).await;
        let file = staged(512, "video/mp4").await;
        let staged_path = file.path().to_path_buf();

        let outcome = pipeline(&store, None)
            .run(UploadJob { record_id, file })
            .await;

        assert_eq!(outcome, ReconcileOutcome::Failed);
        assert_eq!(
            store.get(record_id).await.unwrap().unwrap().status,
            UploadStatus::Error
        );
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_terminal_record_is_left_alone() {
        let store = InMemoryUploadRecordStore::new();
        let record_id = seeded(&store).await;
        let host = Arc::new(FakeVideoHost::ready("pb_1"));
        let p = pipeline(&store, Some(host));

        let first = p
            .run(UploadJob {
                record_id,
                file: staged(64, "video/mp4").await,
            })
            .await;
        assert_eq!(first, ReconcileOutcome::Ready);

        let second = p
            .run(UploadJob {
                record_id,
                file: staged(64, "video/mp4").await,
            })
            .await;
        assert_eq!(second, ReconcileOutcome::Skipped);
        assert_eq!(
            store.get(record_id).await.unwrap().unwrap().playback_id.as_deref(),
            Some("pb_1")
        );
    }
}
