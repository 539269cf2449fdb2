//! Integration tests for behaviour while backing stores are failing.

mod helpers;

use std::sync::Arc;

use http::StatusCode;

use kydohub_core::types::{TenantId, UserId};

use helpers::{DownCache, DownRevocations, TestApp, test_config};

async fn degraded_app() -> TestApp {
    TestApp::build(test_config(), Arc::new(DownCache), |store| {
        store.revocations = Arc::new(DownRevocations);
    })
    .await
}

#[tokio::test]
async fn test_reads_fail_open_when_revocation_state_unreachable() {
    let app = degraded_app().await;
    let (tenant, teacher) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    app.add_student(tenant, "s1", "Ada", "room-a").await;
    let token = app.token(tenant, teacher).await;

    let response = app.request("GET", "/api/students", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total"], 1);
}

#[tokio::test]
async fn test_logout_reports_unconfirmed_revocation() {
    let app = degraded_app().await;
    let (tenant, teacher) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    let token = app.token(tenant, teacher).await;

    let response = app
        .request(
            "POST",
            "/api/auth/logout",
            Some(serde_json::json!({ "client": "mobile" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.error_code(), Some("DEPENDENCY_UNAVAILABLE"));
}

#[tokio::test]
async fn test_health_degraded_without_cache() {
    let app = degraded_app().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "degraded");
    assert_eq!(response.body["data"]["cache"], "unavailable");
}
