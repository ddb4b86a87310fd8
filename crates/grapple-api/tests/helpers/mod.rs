//! Test helpers: build the app on the in-memory store and a scripted video host.
//!
//! No database or network is needed: `cargo test -p grapple-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use grapple_api::constants;
use grapple_api::setup::{routes, services};
use grapple_api::state::AppState;
use grapple_core::models::{UploadRecord, UploadStatus};
use grapple_core::{BaseConfig, Config, UploadPipelineConfig, UploadServiceConfig, VideoHostConfig};
use grapple_db::test_helpers::InMemoryUploadRecordStore;
use grapple_video::test_helpers::FakeVideoHost;
use grapple_video::VideoHost;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const MB: usize = 1024 * 1024;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn test_config(max_video_size_bytes: usize) -> Config {
    Config(Box::new(UploadServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            environment: "test".to_string(),
        },
        database_url: "postgres://localhost/grapple_test".to_string(),
        video_host: VideoHostConfig {
            base_url: "http://localhost".to_string(),
            token_id: None,
            token_secret: None,
            playback_policy: "public".to_string(),
            cors_origin: "*".to_string(),
            request_timeout_secs: 0,
        },
        pipeline: UploadPipelineConfig {
            max_video_size_bytes,
            poll_max_attempts: 20,
            poll_interval_ms: 1,
            stale_sweep_interval_secs: 0,
            ..UploadPipelineConfig::default()
        },
    }))
}

pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryUploadRecordStore,
    pub host: Option<Arc<FakeVideoHost>>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app(host: Option<FakeVideoHost>) -> TestApp {
    setup_test_app_with_limit(host, 64 * MB)
}

pub fn setup_test_app_with_limit(host: Option<FakeVideoHost>, max_video_size_bytes: usize) -> TestApp {
    let config = test_config(max_video_size_bytes);
    let store = InMemoryUploadRecordStore::new();
    let host = host.map(Arc::new);

    let state = services::build_state(
        &config,
        Arc::new(store.clone()),
        host.clone().map(|h| h as Arc<dyn VideoHost>),
    );
    let router = routes::setup_routes(&config, state.clone()).expect("routes");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        store,
        host,
        state,
    }
}

pub fn video_part(len: usize, mime: &str) -> Part {
    Part::bytes(vec![7u8; len])
        .file_name("roll.mp4")
        .mime_type(mime)
}

/// The Armbar form with a video of `len` bytes.
pub fn armbar_form(len: usize) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", "Armbar")
        .add_text("position", "Guard")
        .add_text("userId", "u1")
        .add_part("file", video_part(len, "video/mp4"))
}

/// Poll the status endpoint until the record leaves `uploading`.
pub async fn wait_for_terminal(server: &TestServer, id: Uuid) -> UploadRecord {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let record: UploadRecord = server
                .get(&api_path(&format!("/videos/{}", id)))
                .await
                .json();
            if record.status != UploadStatus::Uploading {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("record should reach a terminal status")
}
