//! Integration tests for transport concerns: rate limiting, request ids,
//! security headers, key publication, health.

mod helpers;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use http::StatusCode;

use kydohub_core::types::{TenantId, UserId};

use helpers::{TestApp, json_request, test_config};

const PROXY: &str = "127.0.0.1";

fn logout_request(peer: &str, forwarded_for: Option<&str>) -> http::request::Builder {
    let peer = SocketAddr::new(peer.parse().unwrap(), 50000);
    let mut req = json_request("POST", "/api/auth/logout")
        .header("x-client", "mobile")
        .extension(ConnectInfo(peer));
    if let Some(ip) = forwarded_for {
        req = req.header("x-forwarded-for", ip);
    }
    req
}

async fn logout_from(app: &TestApp, forwarded_for: Option<&str>) -> helpers::TestResponse {
    app.send(logout_request(PROXY, forwarded_for).body(Body::empty()).unwrap())
        .await
}

#[tokio::test]
async fn test_auth_endpoints_rate_limited_per_client() {
    let mut config = test_config();
    config.rate_limit.burst = 2;
    config.rate_limit.per_minute = 0;
    config.rate_limit.trusted_proxies = vec![PROXY.parse().unwrap()];
    let app = TestApp::with_config(config).await;

    assert_eq!(logout_from(&app, Some("10.0.0.1")).await.status, StatusCode::NO_CONTENT);
    assert_eq!(logout_from(&app, Some("10.0.0.1")).await.status, StatusCode::NO_CONTENT);

    let limited = logout_from(&app, Some("10.0.0.1")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.error_code(), Some("RATE_LIMITED"));

    let other = logout_from(&app, Some("10.0.0.2, 192.168.1.1")).await;
    assert_eq!(other.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_forwarded_for_from_untrusted_peer_cannot_dodge_limit() {
    let mut config = test_config();
    config.rate_limit.burst = 2;
    config.rate_limit.per_minute = 0;
    let app = TestApp::with_config(config).await;

    let mut statuses = Vec::new();
    for spoofed in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        let req = logout_request("198.51.100.7", Some(spoofed));
        statuses.push(app.send(req.body(Body::empty()).unwrap()).await.status);
    }
    assert_eq!(
        statuses,
        [StatusCode::NO_CONTENT, StatusCode::NO_CONTENT, StatusCode::TOO_MANY_REQUESTS]
    );

    let other = app
        .send(logout_request("198.51.100.8", None).body(Body::empty()).unwrap())
        .await;
    assert_eq!(other.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_auth_endpoints_rate_limited_per_user() {
    let mut config = test_config();
    config.rate_limit.user_burst = 2;
    config.rate_limit.user_per_minute = 0;
    config.rate_limit.trusted_proxies = vec![PROXY.parse().unwrap()];
    let app = TestApp::with_config(config).await;
    let tenant = TenantId::new();
    let (busy, quiet) = (UserId::new(), UserId::new());
    app.add_admin(tenant, busy).await;
    app.add_admin(tenant, quiet).await;
    let busy_token = app.token(tenant, busy).await;
    let quiet_token = app.token(tenant, quiet).await;

    let send = |token: String, ip: &'static str| {
        let req = logout_request(PROXY, Some(ip))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        app.send(req)
    };

    assert_eq!(send(busy_token.clone(), "10.1.0.1").await.status, StatusCode::NO_CONTENT);
    assert_eq!(send(busy_token.clone(), "10.1.0.2").await.status, StatusCode::NO_CONTENT);
    let limited = send(busy_token, "10.1.0.3").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.error_code(), Some("RATE_LIMITED"));

    assert_eq!(send(quiet_token, "10.1.0.3").await.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_rate_limit_skips_resource_routes() {
    let mut config = test_config();
    config.rate_limit.burst = 1;
    config.rate_limit.per_minute = 0;
    let app = TestApp::with_config(config).await;

    for _ in 0..3 {
        let response = app.request("GET", "/api/students", None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let app = TestApp::new().await;

    let generated = app.request("GET", "/api/health", None, None).await;
    let id = generated.headers["x-request-id"].to_str().unwrap();
    assert!(!id.is_empty());

    let echoed = app
        .send(
            json_request("GET", "/api/health")
                .header("x-request-id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(echoed.headers["x-request-id"], "trace-42");
}

#[tokio::test]
async fn test_health_reports_backends() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "connected");
    assert_eq!(response.body["data"]["cache"], "connected");
}

#[tokio::test]
async fn test_baseline_security_headers() {
    let app = TestApp::new().await;

    for response in [
        app.request("GET", "/api/health", None, None).await,
        app.request("GET", "/api/students", None, None).await,
    ] {
        assert_eq!(response.headers["x-content-type-options"], "nosniff");
        assert_eq!(response.headers["x-frame-options"], "DENY");
        assert_eq!(
            response.headers["referrer-policy"],
            "strict-origin-when-cross-origin"
        );
    }
}

#[tokio::test]
async fn test_jwks_publishes_signing_key() {
    let mut config = test_config();
    config.auth.algorithm = "RS256".to_string();
    config.auth.private_key_pem = Some(include_str!("../fixtures/rs256_private.pem").to_string());
    config.auth.public_key_pem = Some(include_str!("../fixtures/rs256_public.pem").to_string());
    let app = TestApp::with_config(config).await;
    let token = app.token_with_ev(TenantId::new(), UserId::new(), 1);
    let kid = jsonwebtoken::decode_header(&token).unwrap().kid.unwrap();

    let response = app.request("GET", "/.well-known/jwks.json", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let keys = response.body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["kid"], kid.as_str());
    assert_eq!(keys[0]["kty"], "RSA");
    assert_eq!(keys[0]["alg"], "RS256");
    assert_eq!(keys[0]["use"], "sig");
    assert!(keys[0].get("d").is_none());
}

#[tokio::test]
async fn test_jwks_empty_for_shared_secret() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/.well-known/jwks.json", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["keys"], serde_json::json!([]));
}
