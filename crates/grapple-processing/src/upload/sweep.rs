//! Periodic sweep for records stranded in `uploading`.
//!
//! A run whose reconciliation writes both failed (or a process that died
//! mid-run) leaves its record `uploading` forever. The sweeper fails every
//! such record older than the deadline, through the same guarded update, so
//! terminal records are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use grapple_core::AppError;
use grapple_db::UploadRecordStore;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

pub struct StaleUploadSweeper {
    shutdown_tx: mpsc::Sender<()>,
}

impl StaleUploadSweeper {
    /// Spawn the sweep loop. Returns `None` when `every` is zero (disabled).
    pub fn start(
        store: Arc<dyn UploadRecordStore>,
        every: Duration,
        deadline: Duration,
    ) -> Option<Self> {
        if every.is_zero() {
            tracing::info!("Stale upload sweep disabled");
            return None;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            Self::sweep_loop(store, every, deadline, shutdown_rx).await;
        });

        tracing::info!(
            interval_secs = every.as_secs(),
            deadline_secs = deadline.as_secs(),
            "Stale upload sweeper started"
        );
        Some(Self { shutdown_tx })
    }

    /// Fail every `uploading` record created more than `deadline` ago.
    pub async fn sweep_once(
        store: &dyn UploadRecordStore,
        deadline: Duration,
    ) -> Result<u64, AppError> {
        let deadline = chrono::Duration::from_std(deadline)
            .map_err(|e| AppError::Internal(format!("Invalid sweep deadline: {}", e)))?;
        let failed = store.fail_stale_uploads(Utc::now() - deadline).await?;
        if failed > 0 {
            tracing::warn!(failed, "Failed stale uploads past their deadline");
        }
        Ok(failed)
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn sweep_loop(
        store: Arc<dyn UploadRecordStore>,
        every: Duration,
        deadline: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = Self::sweep_once(store.as_ref(), deadline).await {
                        tracing::error!(error = %e, "Stale upload sweep failed");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        tracing::info!("Stale upload sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::models::{NewUploadRecord, UploadStatus};
    use grapple_db::test_helpers::InMemoryUploadRecordStore;
    use uuid::Uuid;

    fn new_record() -> NewUploadRecord {
        NewUploadRecord {
            title: "Kimura".into(),
            position: "Side control".into(),
            user_id: "u2".into(),
            description: None,
            thumbnail_time: 0.0,
        }
    }

    #[tokio::test]
    async fn test_sweep_once_fails_only_stale_records() {
        let store = InMemoryUploadRecordStore::new();
        let stale = new_record().into_record(Uuid::new_v4(), Utc::now() - chrono::Duration::hours(3));
        store.insert(stale.clone());
        let fresh = store.create(new_record()).await.unwrap();

        let failed = StaleUploadSweeper::sweep_once(&store, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(failed, 1);
        assert_eq!(store.get(stale.id).await.unwrap().unwrap().status, UploadStatus::Error);
        assert_eq!(store.get(fresh.id).await.unwrap().unwrap().status, UploadStatus::Uploading);
    }

    #[tokio::test]
    async fn test_zero_interval_disables_sweeper() {
        let store: Arc<dyn UploadRecordStore> = Arc::new(InMemoryUploadRecordStore::new());
        assert!(StaleUploadSweeper::start(store, Duration::ZERO, Duration::from_secs(60)).is_none());
    }

    #[tokio::test]
    async fn test_loop_sweeps_on_start() {
        let store = InMemoryUploadRecordStore::new();
        let stale = new_record().into_record(Uuid::new_v4(), Utc::now() - chrono::Duration::hours(3));
        store.insert(stale.clone());

        let sweeper = StaleUploadSweeper::start(
            Arc::new(store.clone()),
            Duration::from_secs(300),
            Duration::from_secs(3600),
        )
        .unwrap();

        // The first interval tick fires immediately.
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let status = store.get(stale.id).await.unwrap().unwrap().status;
                if status == UploadStatus::Error {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("stale record should be swept");

        sweeper.shutdown().await;
    }
}
