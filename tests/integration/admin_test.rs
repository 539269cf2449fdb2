//! Integration tests for tenant administration endpoints.

mod helpers;

use http::StatusCode;

use kydohub_core::types::{TenantId, UserId};

use helpers::TestApp;

#[tokio::test]
async fn test_teacher_cannot_assign_roles() {
    let app = TestApp::new().await;
    let (tenant, teacher, other) = (TenantId::new(), UserId::new(), UserId::new());
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    app.add_teacher(tenant, other, &["room-b"]).await;
    let token = app.token(tenant, teacher).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{other}/roles"),
            Some(serde_json::json!({ "roles": ["admin"] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn test_assign_roles_stales_target_tokens() {
    let app = TestApp::new().await;
    let (tenant, admin, teacher) = (TenantId::new(), UserId::new(), UserId::new());
    app.add_admin(tenant, admin).await;
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    let admin_token = app.token(tenant, admin).await;
    let teacher_token = app.token(tenant, teacher).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{teacher}/roles"),
            Some(serde_json::json!({ "roles": ["guardian", " teacher ", "guardian"] })),
            Some(&admin_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["roles"],
        serde_json::json!(["guardian", "teacher"])
    );

    let stale = app
        .request("GET", "/api/students", None, Some(&teacher_token))
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.error_code(), Some("EV_OUTDATED"));

    let fresh = app.token(tenant, teacher).await;
    let context = app
        .request("GET", "/api/me/context", None, Some(&fresh))
        .await;
    assert_eq!(context.status, StatusCode::OK);
    assert_eq!(context.body["data"]["meta"]["ev"], 2);
    assert_eq!(
        context.body["data"]["roles"],
        serde_json::json!(["guardian", "teacher"])
    );
}

#[tokio::test]
async fn test_logout_all_ends_every_session() {
    let app = TestApp::new().await;
    let (tenant, admin, teacher) = (TenantId::new(), UserId::new(), UserId::new());
    app.add_admin(tenant, admin).await;
    app.add_teacher(tenant, teacher, &["room-a"]).await;
    let admin_token = app.token(tenant, admin).await;
    let session = app.mobile_session(tenant, teacher).await;
    let access = session["access"].as_str().unwrap().to_string();
    let refresh = session["refresh"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            &format!("/api/admin/users/{teacher}/logout-all"),
            None,
            Some(&admin_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["ev"], 2);
    assert_eq!(response.body["data"]["user_id"], teacher.to_string());

    let context = app
        .request("GET", "/api/me/context", None, Some(&access))
        .await;
    assert_eq!(context.error_code(), Some("EV_OUTDATED"));

    let refreshed = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(serde_json::json!({ "refresh": refresh, "client": "mobile" })),
            None,
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_member_not_found() {
    let app = TestApp::new().await;
    let (tenant, admin) = (TenantId::new(), UserId::new());
    app.add_admin(tenant, admin).await;
    let token = app.token(tenant, admin).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/admin/users/{}/roles", UserId::new()),
            Some(serde_json::json!({ "roles": ["teacher"] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
