//! Health and docs endpoint tests.

mod helpers;

use grapple_video::test_helpers::FakeVideoHost;
use helpers::setup_test_app;
use serde_json::{json, Value};

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app(Some(FakeVideoHost::ready("pb_123")));

    let response = app.client().get("/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "status": "alive" }));
}

#[tokio::test]
async fn test_readiness_checks_the_store() {
    let app = setup_test_app(Some(FakeVideoHost::ready("pb_123")));

    let response = app.client().get("/health/ready").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ready", "database": "ready" }));
}

#[tokio::test]
async fn test_openapi_document_lists_video_routes() {
    let app = setup_test_app(None);

    let body: Value = app.client().get("/api/openapi.json").await.json();

    assert!(body["paths"]["/api/v0/videos"]["post"].is_object());
    assert!(body["paths"]["/api/v0/videos/{id}"]["get"].is_object());
}
