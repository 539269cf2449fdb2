//! Integration tests for the session lifecycle endpoints.

mod helpers;

use axum::body::Body;
use http::StatusCode;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use kydohub_auth::with_refresh_retry;
use kydohub_core::error::AppError;
use kydohub_core::types::{TenantId, UserId};

use helpers::{ORIGIN, TestApp, cookie_header, json_request};

async fn mobile_refresh(app: &TestApp, refresh: &str) -> helpers::TestResponse {
    app.send(
        json_request("POST", "/api/auth/refresh")
            .header("x-client", "mobile")
            .body(Body::from(
                serde_json::json!({ "refresh": refresh }).to_string(),
            ))
            .unwrap(),
    )
    .await
}

async fn web_exchange(app: &TestApp, tenant: TenantId, user: UserId) -> helpers::TestResponse {
    app.send(
        json_request("POST", "/api/auth/exchange")
            .body(Body::from(
                serde_json::json!({
                    "provider": "supabase",
                    "token": app.identity_token(user),
                    "tenantHint": tenant,
                })
                .to_string(),
            ))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_exchange_single_tenant_mobile() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;

    let response = app
        .send(
            json_request("POST", "/api/auth/exchange")
                .body(Body::from(
                    serde_json::json!({
                        "provider": "supabase",
                        "token": app.identity_token(user),
                        "client": "mobile",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["tenant_id"], tenant.to_string());
    assert_eq!(data["ev"], 1);
    assert!(data["access"].is_string());
    assert_eq!(data["refresh"].as_str().map(str::len), Some(43));
}

#[tokio::test]
async fn test_exchange_multiple_tenants_asks_for_choice() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, user) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_teacher(tenant_a, user, &["room-a"]).await;
    app.add_teacher(tenant_b, user, &["room-b"]).await;

    let response = app
        .request(
            "POST",
            "/api/auth/exchange",
            Some(serde_json::json!({ "token": app.identity_token(user) })),
            None,
        )
        .await;

    assert_eq!(response.status.as_u16(), 209);
    let tenants = response.body["data"]["tenants"].as_array().unwrap();
    assert_eq!(tenants.len(), 2);
    assert!(response.set_cookie_line("kydo_sess").is_none());
}

#[tokio::test]
async fn test_exchange_without_membership_denied() {
    let app = TestApp::new().await;
    let response = app
        .request(
            "POST",
            "/api/auth/exchange",
            Some(serde_json::json!({ "token": app.identity_token(UserId::new()) })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_exchange_rejects_forged_identity_token() {
    let app = TestApp::new().await;
    let response = app
        .request(
            "POST",
            "/api/auth/exchange",
            Some(serde_json::json!({ "token": "eyJhbGciOiJIUzI1NiJ9.e30.sig" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_web_exchange_sets_session_cookies() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;

    let response = web_exchange(&app, tenant, user).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let access = response.set_cookie_line("kydo_sess").unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Lax"));
    assert!(access.contains("Secure"));
    assert!(access.contains("Path=/"));
    let refresh = response.set_cookie_line("kydo_refresh").unwrap();
    assert!(refresh.contains("Path=/api/auth/refresh"));
    let csrf = response.set_cookie_line("kydo_csrf").unwrap();
    assert!(!csrf.contains("HttpOnly"));

    let session = response.cookie("kydo_sess").unwrap();
    let context = app
        .send(
            json_request("GET", "/api/me/context")
                .header("cookie", cookie_header(&[("kydo_sess", &session)]))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(context.status, StatusCode::OK);
    assert_eq!(context.body["data"]["user_id"], user.to_string());
}

#[tokio::test]
async fn test_web_refresh_requires_csrf() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;
    let login = web_exchange(&app, tenant, user).await;
    let refresh = login.cookie("kydo_refresh").unwrap();
    let csrf = login.cookie("kydo_csrf").unwrap();
    let cookies = cookie_header(&[("kydo_refresh", &refresh), ("kydo_csrf", &csrf)]);

    let missing = app
        .send(
            json_request("POST", "/api/auth/refresh")
                .header("cookie", &cookies)
                .header("origin", ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    let foreign = app
        .send(
            json_request("POST", "/api/auth/refresh")
                .header("cookie", &cookies)
                .header("origin", "https://evil.example")
                .header("x-csrf-token", &csrf)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let ok = app
        .send(
            json_request("POST", "/api/auth/refresh")
                .header("cookie", &cookies)
                .header("origin", ORIGIN)
                .header("x-csrf-token", &csrf)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(ok.status, StatusCode::NO_CONTENT);
    assert_ne!(ok.cookie("kydo_refresh").unwrap(), refresh);
}

#[tokio::test]
async fn test_mobile_refresh_rotates_and_detects_reuse() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;
    let first = app.mobile_session(tenant, user).await;
    let r1 = first["refresh"].as_str().unwrap().to_string();

    let rotated = mobile_refresh(&app, &r1).await;
    assert_eq!(rotated.status, StatusCode::OK);
    let r2 = rotated.body["data"]["refresh"].as_str().unwrap().to_string();
    let access2 = rotated.body["data"]["access"].as_str().unwrap().to_string();
    assert_ne!(r1, r2);

    let replay = mobile_refresh(&app, &r1).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    let successor = mobile_refresh(&app, &r2).await;
    assert_eq!(successor.status, StatusCode::UNAUTHORIZED);

    let context = app
        .request("GET", "/api/me/context", None, Some(&access2))
        .await;
    assert_eq!(context.error_code(), Some("EV_OUTDATED"));
}

#[tokio::test]
async fn test_refresh_then_retry_after_ev_bump() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;
    for _ in 0..4 {
        app.state
            .admin
            .assign_roles(tenant, user, &["teacher".to_string()])
            .await
            .unwrap();
    }

    let session = app.mobile_session(tenant, user).await;
    assert_eq!(session["ev"], 5);
    let refresh = session["refresh"].as_str().unwrap().to_string();
    let access = &Mutex::new(session["access"].as_str().unwrap().to_string());

    app.state
        .admin
        .assign_roles(tenant, user, &["teacher".to_string()])
        .await
        .unwrap();

    let app = &app;
    let attempts = &AtomicUsize::new(0);
    let refreshes = &AtomicUsize::new(0);
    let body = with_refresh_retry(
        || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            let token = access.lock().unwrap().clone();
            app.request("GET", "/api/me/context", None, Some(&token))
                .await
                .into_result()
        },
        || async move {
            refreshes.fetch_add(1, Ordering::SeqCst);
            let body = mobile_refresh(app, &refresh).await.into_result()?;
            *access.lock().unwrap() = body["data"]["access"].as_str().unwrap().to_string();
            Ok::<(), AppError>(())
        },
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["meta"]["ev"], 6);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent_and_revokes() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;
    let session = app.mobile_session(tenant, user).await;
    let access = session["access"].as_str().unwrap().to_string();
    let refresh = session["refresh"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = app
            .send(
                json_request("POST", "/api/auth/logout")
                    .header("x-client", "mobile")
                    .header("Authorization", format!("Bearer {access}"))
                    .body(Body::from(
                        serde_json::json!({ "refresh": refresh }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    let context = app
        .request("GET", "/api/me/context", None, Some(&access))
        .await;
    assert_eq!(context.status, StatusCode::UNAUTHORIZED);
    assert_eq!(context.error_code(), Some("UNAUTHENTICATED"));
    assert_eq!(
        mobile_refresh(&app, &refresh).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_web_logout_clears_cookies() {
    let app = TestApp::new().await;
    let (tenant, user) = (TenantId::new(), UserId::new());
    app.add_teacher(tenant, user, &["room-a"]).await;
    let login = web_exchange(&app, tenant, user).await;
    let session = login.cookie("kydo_sess").unwrap();
    let csrf = login.cookie("kydo_csrf").unwrap();

    let response = app
        .send(
            json_request("POST", "/api/auth/logout")
                .header(
                    "cookie",
                    cookie_header(&[("kydo_sess", &session), ("kydo_csrf", &csrf)]),
                )
                .header("origin", ORIGIN)
                .header("x-csrf-token", &csrf)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.cookie("kydo_sess").as_deref(), Some(""));
    assert_eq!(response.cookie("kydo_csrf").as_deref(), Some(""));
}

#[tokio::test]
async fn test_switch_tenant() {
    let app = TestApp::new().await;
    let (tenant_a, tenant_b, user) = (TenantId::new(), TenantId::new(), UserId::new());
    app.add_teacher(tenant_a, user, &["room-a"]).await;
    app.add_teacher(tenant_b, user, &["room-b"]).await;
    let session = app.mobile_session(tenant_a, user).await;
    let access = session["access"].as_str().unwrap().to_string();

    let switched = app
        .send(
            json_request("POST", "/api/auth/switch")
                .header("x-client", "mobile")
                .header("Authorization", format!("Bearer {access}"))
                .body(Body::from(
                    serde_json::json!({ "tenantId": tenant_b }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(switched.status, StatusCode::OK);
    assert_eq!(switched.body["data"]["tenant_id"], tenant_b.to_string());

    let denied = app
        .send(
            json_request("POST", "/api/auth/switch")
                .header("x-client", "mobile")
                .header("Authorization", format!("Bearer {access}"))
                .body(Body::from(
                    serde_json::json!({ "tenantId": TenantId::new() }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}
