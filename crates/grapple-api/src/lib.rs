//! Grapple HTTP service.
//!
//! Exposes the upload intake and status query over axum, wires the pipeline
//! workers at startup and stops them on shutdown.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;
