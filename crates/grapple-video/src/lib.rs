//! Video host integration.
//!
//! The upload pipeline talks to the host only through [`VideoHost`]: request a
//! one-time upload target, push the file bytes to it, then look up the upload
//! and asset until a playback id exists. [`MuxClient`] implements it against
//! the Mux Video API.

pub mod error;
pub mod host;
pub mod mux;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::VideoHostError;
pub use host::VideoHost;
pub use mux::MuxClient;
pub use types::{AssetStatus, ByteStream, UploadSource, UploadStatusInfo, UploadTarget};
