//! Integration tests for the route guard and tenant-scoped listings.

mod helpers;

use axum::body::Body;
use http::StatusCode;

use kydohub_core::types::{TenantId, UserId};
use kydohub_database::repositories::UiResourceRepository;
use kydohub_entity::ui::{UiPage, UiResources};

use helpers::{TestApp, json_request};

fn ids(body: &serde_json::Value) -> Vec<String> {
    body["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|s| s["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_missing_credential_returns_envelope() {
    let app = TestApp::new().await;

    let response = app
        .send(
            json_request("GET", "/api/students")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("UNAUTHENTICATED"));
    assert_eq!(response.body["request_id"], "req-123");
    assert_eq!(response.headers["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request("GET", "/api/me/context", None, Some("not.a.token"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_teacher_sees_only_assigned_rooms() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, teacher) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_teacher(tenant_a, teacher, &["room-a"]).await;
    app.add_student(tenant_a, "s1", "Ada", "room-a").await;
    app.add_student(tenant_a, "s2", "Ben", "room-b").await;
    app.add_student(tenant_b, "s3", "Cy", "room-a").await;
    let token = app.token(tenant_a, teacher).await;

    let response = app.request("GET", "/api/students", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["s1"]);
    assert_eq!(response.body["data"]["total"], 1);
}

#[tokio::test]
async fn test_tenant_comes_from_token_only() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, teacher) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_teacher(tenant_a, teacher, &["room-a"]).await;
    app.add_student(tenant_a, "s1", "Ada", "room-a").await;
    app.add_student(tenant_b, "s3", "Cy", "room-a").await;
    let token = app.token(tenant_a, teacher).await;

    let response = app
        .send(
            json_request("GET", &format!("/api/students?tenant_id={tenant_b}"))
                .header("Authorization", format!("Bearer {token}"))
                .header("x-tenant-id", tenant_b.to_string())
                .body(Body::from(
                    serde_json::json!({ "tenant_id": tenant_b }).to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["s1"]);
}

#[tokio::test]
async fn test_list_all_denied_without_leaking_permission_names() {
    let app = TestApp::new().await;
    let (tenant, teacher) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    let token = app.token(tenant, teacher).await;

    let response = app
        .request("GET", "/api/students/all", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), Some("PERMISSION_DENIED"));
    let raw = response.body.to_string();
    assert!(!raw.contains("list_all"));
    assert!(!raw.contains("teacher"));
}

#[tokio::test]
async fn test_admin_lists_whole_tenant_only() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, admin) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_admin(tenant_a, admin).await;
    app.add_student(tenant_a, "s1", "Ada", "room-a").await;
    app.add_student(tenant_a, "s2", "Ben", "room-b").await;
    app.add_student(tenant_b, "s3", "Cy", "room-a").await;
    let token = app.token(tenant_a, admin).await;

    let response = app
        .request("GET", "/api/students/all", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["s1", "s2"]);
}

#[tokio::test]
async fn test_empty_scope_lists_nothing() {
    let app = TestApp::new().await;
    let (tenant, teacher) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &[]).await;
    app.add_student(tenant, "s1", "Ada", "room-a").await;
    let token = app.token(tenant, teacher).await;

    let response = app.request("GET", "/api/students", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(ids(&response.body).is_empty());
}

#[tokio::test]
async fn test_token_for_foreign_tenant_denied() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, teacher) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_teacher(tenant_a, teacher, &["room-a"]).await;
    let foreign = app.token_with_ev(tenant_b, teacher, 1);

    let response = app
        .request("GET", "/api/students", None, Some(&foreign))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stale_token_after_role_change() {
    let app = TestApp::new().await;
    let (tenant, teacher) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    let token = app.token(tenant, teacher).await;

    assert_eq!(
        app.request("GET", "/api/me/context", None, Some(&token))
            .await
            .status,
        StatusCode::OK
    );

    app.state
        .admin
        .assign_roles(tenant, teacher, &["guardian".to_string()])
        .await
        .unwrap();

    let response = app
        .request("GET", "/api/me/context", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("EV_OUTDATED"));
}

#[tokio::test]
async fn test_me_context_shape() {
    let app = TestApp::new().await;
    let (tenant, admin) = (TenantId::new(), UserId::new());
    app.add_admin(tenant, admin).await;
    let page = |id: &str, title: &str, order: Option<i32>| UiPage {
        id: id.to_string(),
        title: title.to_string(),
        path: String::new(),
        requires: vec![],
        icon: None,
        order,
        section: None,
    };
    UiResourceRepository::put(
        &app.db,
        tenant,
        &UiResources {
            pages: vec![
                page("reports", "Reports", Some(2)),
                page("students", "Students", None),
            ],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let token = app.token(tenant, admin).await;

    let response = app
        .request("GET", "/api/me/context", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["tenant_id"], tenant.to_string());
    assert_eq!(data["roles"], serde_json::json!(["admin"]));
    assert_eq!(
        data["permissions"],
        serde_json::json!([
            "roles.manage",
            "students.list_all",
            "students.view",
            "users.manage"
        ])
    );
    assert_eq!(data["ui"]["pages"][0]["id"], "students");
    assert_eq!(data["ui"]["pages"][1]["id"], "reports");
    assert_eq!(data["meta"]["ev"], 1);
    assert!(data["meta"]["request_id"].is_string());
}
