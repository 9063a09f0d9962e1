//! HTTP surface driven through the router with `oneshot`

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{CountingCache, CountingStore, RecordingPostHandler, TestEnv};
use datasrv::routes::create_routes;
use datasrv::DatasrvConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(env: &TestEnv, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_routes(env.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_ingest_then_read_back() {
    let env = TestEnv::new();

    let (status, body) = send(
        &env,
        post(
            "/api/v1/point_values",
            json!({"device_id": 1, "point_id": 10, "value": 231.4, "origin_time": 1_700_000_000_000_i64,
                   "time_out": 10, "time_unit": "MINUTES"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["accepted"], 1);
    env.settle().await;

    let (status, body) = send(&env, get("/api/v1/point_values/realtime/1/10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "231.4");
    assert!(body["data"].get("time_out").is_none());
    assert!(body["data"]["create_time"].is_i64());

    let (_, body) = send(&env, get("/api/v1/point_values/realtime/1")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(&env, get("/api/v1/point_values/latest/1")).await;
    let latest = body["data"].as_array().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["unit"], "V");
    assert_eq!(latest[0]["rw"], 0);

    let (_, body) = send(&env, get("/api/v1/point_values/latest/1/10")).await;
    assert_eq!(body["data"]["origin_time"], 1_700_000_000_000_i64);
}

#[tokio::test]
async fn test_unknown_entities_read_as_empty() {
    let env = TestEnv::new();

    let (status, body) = send(&env, get("/api/v1/point_values/realtime/42/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, body) = send(&env, get("/api/v1/point_values/latest/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(&env, post("/api/v1/point_values/list", json!({"device_id": 42}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_batch_and_list_pagination() {
    let env = TestEnv::new();
    let readings: Vec<Value> = (1..=25)
        .map(|i| json!({"device_id": 1, "point_id": 10, "value": i, "origin_time": i * 1_000}))
        .collect();

    let (status, body) = send(&env, post("/api/v1/point_values/batch", Value::Array(readings))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["accepted"], 25);
    env.settle().await;

    let (status, body) = send(
        &env,
        post(
            "/api/v1/point_values/list",
            json!({"device_id": 1, "point_id": 10, "page": {"current": 2, "size": 10}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["total"], 25);
    assert_eq!(page["current"], 2);
    let records = page["records"].as_array().unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["value"], "15");
}

#[tokio::test]
async fn test_list_surfaces_store_failure() {
    let env = TestEnv::with(
        CountingStore::failing_reads(),
        CountingCache::default(),
        RecordingPostHandler::default(),
        DatasrvConfig::in_memory(),
    );

    let (status, body) = send(
        &env,
        post(
            "/api/v1/point_values/list",
            json!({"device_id": 1, "page": {"current": 1, "size": 10}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], 503);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_inverted_window_rejected_when_configured() {
    let mut config = DatasrvConfig::in_memory();
    config.query.reject_inverted_window = true;
    let env = TestEnv::with(
        CountingStore::default(),
        CountingCache::default(),
        RecordingPostHandler::default(),
        config,
    );

    let (status, body) = send(
        &env,
        post(
            "/api/v1/point_values/list",
            json!({"page": {"start_time": 2_000, "end_time": 1_000}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health_reports_components() {
    let env = TestEnv::new();

    let (status, body) = send(&env, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["service"], "datasrv");
    assert_eq!(body["data"]["checks"]["store"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["cache"]["status"], "healthy");
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() {
    let env = TestEnv::new();

    let (status, _) = send(&env, post("/api/v1/point_values", json!({"point_id": 1}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_log_level_requires_initialized_logging() {
    let env = TestEnv::new();

    let (status, body) = send(&env, get("/api/admin/logs/level")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], "unknown");

    // No subscriber was installed by this binary, so there is nothing to reload
    let (status, body) = send(&env, post("/api/admin/logs/level", json!({"level": "debug"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
