//! In-memory store for tests that exercise the pipeline without PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grapple_core::models::{NewUploadRecord, UploadRecord, UploadRecordPatch, UploadStatus};
use grapple_core::AppError;
use uuid::Uuid;

use crate::store::UploadRecordStore;

#[derive(Clone, Default)]
pub struct InMemoryUploadRecordStore {
    records: Arc<Mutex<HashMap<Uuid, UploadRecord>>>,
    fail_creates: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
    fail_next_update: Arc<AtomicBool>,
}

impl InMemoryUploadRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create` return a database error.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `update` return a database error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Make only the next `update` return a database error.
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    pub fn insert(&self, record: UploadRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn all(&self) -> Vec<UploadRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unavailable() -> AppError {
    AppError::Internal("store unavailable".to_string())
}

#[async_trait]
impl UploadRecordStore for InMemoryUploadRecordStore {
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let record = record.into_record(Uuid::new_v4(), Utc::now());
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: &UploadRecordPatch) -> Result<bool, AppError> {
        if self.fail_updates.load(Ordering::SeqCst)
            || self.fail_next_update.swap(false, Ordering::SeqCst)
        {
            return Err(unavailable());
        }
        let mut records = self.records.lock().unwrap();
        Ok(match records.get_mut(&id) {
            Some(record) => patch.apply_to(record, Utc::now()),
            None => false,
        })
    }

    async fn fail_stale_uploads(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut failed = 0;
        for record in self.records.lock().unwrap().values_mut() {
            if record.status == UploadStatus::Uploading && record.created_at < older_than {
                UploadRecordPatch::failed().apply_to(record, now);
                failed += 1;
            }
        }
        Ok(failed)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
