//! JSON status endpoint and health probes
//!
//! Run with: cargo test --test api_tests

mod common;

use axum::http::StatusCode;
use common::TestEnv;
use credmount_api::kubernetes::memory::FailPoint;
use serde_json::Value;

#[tokio::test]
async fn test_deployments_json_lists_rows() {
    let env = TestEnv::new();
    env.submit("alpha", "pw").await;
    env.submit("beta", "pw").await;
    env.cluster
        .set_deployment_status("app-db-secret-alpha", Some(1), Some(1))
        .await;

    let (status, body) = env.get("/api/deployments").await;
    assert_eq!(status, StatusCode::OK);

    let rows: Value = serde_json::from_str(&body).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "db-secret-alpha");
    assert_eq!(rows[0]["ready_replicas"], 1);
    assert_eq!(rows[0]["total_replicas"], 1);
    assert_eq!(rows[1]["name"], "db-secret-beta");
    assert_eq!(rows[1]["ready_replicas"], 0);
}

#[tokio::test]
async fn test_deployments_json_reports_failures() {
    let env = TestEnv::new();
    env.cluster.fail(FailPoint::ListSecrets).await;

    let (status, body) = env.get("/api/deployments").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["status"], 500);
    assert_eq!(error["error"], "INTERNAL_ERROR");
    assert!(error["timestamp"].is_string());
}

#[tokio::test]
async fn test_liveness() {
    let env = TestEnv::new();

    let (status, body) = env.get("/health/live").await;
    assert_eq!(status, StatusCode::OK);

    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["alive"], true);
}

#[tokio::test]
async fn test_readiness_follows_cluster() {
    let env = TestEnv::new();

    let (status, _) = env.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);

    env.cluster.fail(FailPoint::Ping).await;
    let (status, body) = env.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["ready"], false);
}
