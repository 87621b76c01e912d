//! Integration tests for the request/response generation endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, build_state, build_test_app, get, post_json, spawn_image_server, test_config,
    FakeProvider,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_returns_job_id() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_job_ids(&["J1"]));
    let state = build_state(test_config(dir.path()), Arc::clone(&provider));
    let registry = Arc::clone(&state.registry);

    let response = post_json(
        build_test_app(state),
        "/generate",
        json!({"prompt": "  a red fox  "}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["job_id"], "J1");
    assert_eq!(json["data"]["prompt"], "a red fox");
    assert_eq!(provider.calls(), vec!["imagine:a red fox"]);

    // Request/response mode does not track the job.
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn generate_rejects_missing_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_job_ids(&["J1"]));
    let state = build_state(test_config(dir.path()), Arc::clone(&provider));

    let response = post_json(build_test_app(state), "/generate", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "No prompt provided");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn generate_rejects_overlong_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(test_config(dir.path()), Arc::new(FakeProvider::new()));

    let response = post_json(
        build_test_app(state),
        "/generate",
        json!({"prompt": "x".repeat(1001)}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_without_api_key_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().unconfigured());
    let state = build_state(test_config(dir.path()), provider);

    let response = post_json(build_test_app(state), "/generate", json!({"prompt": "p"})).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFIG_ERROR");
    assert!(json["error"].as_str().unwrap().contains("API key not configured"));
}

#[tokio::test]
async fn generate_provider_failure_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    // No job id queued: the fake answers without one.
    let state = build_state(test_config(dir.path()), Arc::new(FakeProvider::new()));

    let response = post_json(build_test_app(state), "/generate", json!({"prompt": "p"})).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");
}

// ---------------------------------------------------------------------------
// POST /button
// ---------------------------------------------------------------------------

#[tokio::test]
async fn button_starts_action() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_job_ids(&["J2"]));
    let state = build_state(test_config(dir.path()), Arc::clone(&provider));

    let response = post_json(
        build_test_app(state),
        "/button",
        json!({"job_id": "J1", "action": "V3", "prompt": "a red fox"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        json!({
            "job_id": "J2",
            "prompt": "Variation (V3) of: a red fox",
            "action": "V3",
            "original_job_id": "J1"
        })
    );
    assert_eq!(provider.calls(), vec!["button:J1:V3"]);
}

#[tokio::test]
async fn button_rejects_bad_token() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_job_ids(&["J2"]));
    let state = build_state(test_config(dir.path()), Arc::clone(&provider));
    let app = build_test_app(state);

    let response = post_json(
        app.clone(),
        "/button",
        json!({"job_id": "J1", "action": "U5", "prompt": "p"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app, "/button", json!({"action": "U1"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing job id");

    assert!(provider.calls().is_empty());
}

// ---------------------------------------------------------------------------
// GET /status/{job_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_statuses(
        "J1",
        vec![Ok(json!({"data": {"status": "processing", "progress": 42}}))],
    ));
    let state = build_state(test_config(dir.path()), provider);

    let response = get(build_test_app(state), "/status/J1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "PROCESSING");
    assert_eq!(json["data"]["progress"], 42);
    assert_eq!(json["data"]["images"], json!([]));
}

#[tokio::test]
async fn status_done_saves_images_and_lists_them() {
    let images = spawn_image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_statuses(
        "J1",
        vec![Ok(json!({
            "status": "DONE",
            "images": [format!("{images}/1.png")],
            "buttons": ["U1", "V1"]
        }))],
    ));
    let state = build_state(test_config(dir.path()), provider);
    let app = build_test_app(state);

    let response = get(app.clone(), "/status/J1?prompt=a%20red%20fox").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let local = json["data"]["images"][0].as_str().unwrap().to_string();
    assert!(local.starts_with("/output/"));
    assert_eq!(json["data"]["raw_data"]["buttons"], json!(["U1", "V1"]));

    // The saved file is served back under /output.
    let response = get(app.clone(), &local).await;
    assert_eq!(response.status(), StatusCode::OK);

    let generations = body_json(get(app, "/api/generations").await).await;
    assert_eq!(generations["data"][0]["job_id"], "J1");
    assert_eq!(generations["data"][0]["prompt"], "a red fox");
    assert_eq!(generations["data"][0]["buttons"], json!(["U1", "V1"]));
}

#[tokio::test]
async fn status_rejects_ids_that_leave_the_fetch_path() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new());
    let state = build_state(test_config(dir.path()), Arc::clone(&provider));
    let app = build_test_app(state);

    for uri in [
        "/status/..%2F..%2Fsubscription%2Faccount-info",
        "/status/%2E%2E",
        "/status/J1%3Fx%3D1",
        "/status/J1%23frag",
        "/status/J1%5Cx",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR", "{uri}");
    }

    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn status_provider_error_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().with_statuses("J1", vec![Err(404)]));
    let state = build_state(test_config(dir.path()), provider);

    let response = get(build_test_app(state), "/status/J1").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ---------------------------------------------------------------------------
// GET /api/credits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn credits_fill_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(test_config(dir.path()), Arc::new(FakeProvider::new()));

    let response = get(build_test_app(state), "/api/credits").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        json!({
            "credits_extra": 0.0,
            "credits": 42.0,
            "credits_quota": 0.0,
            "plan_type": "PRO",
            "email": "",
            "expired_at": ""
        })
    );
}

#[tokio::test]
async fn credits_without_api_key_fail() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new().unconfigured());
    let state = build_state(test_config(dir.path()), provider);

    let response = get(build_test_app(state), "/api/credits").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
