//! Persistence for upload records.
//!
//! [`UploadRecordStore`] is the seam the pipeline and API depend on;
//! [`UploadRecordRepository`] is the PostgreSQL implementation.

pub mod store;
pub mod upload_record;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use store::UploadRecordStore;
pub use upload_record::UploadRecordRepository;
