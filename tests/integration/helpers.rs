//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::{DateTime, Utc};
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use kydohub_api::{AppState, build_app, build_state};
use kydohub_auth::TokenCodec;
use kydohub_cache::CacheManager;
use kydohub_cache::memory::MemoryCacheProvider;
use kydohub_core::config::AppConfig;
use kydohub_core::config::cache::MemoryCacheConfig;
use kydohub_core::error::{AppError, ErrorKind};
use kydohub_core::result::AppResult;
use kydohub_core::traits::CacheProvider;
use kydohub_core::types::{TenantId, TokenId, UserId};
use kydohub_database::Store;
use kydohub_database::repositories::memory::MemoryDatabase;
use kydohub_database::repositories::{
    EntitlementRepository, MembershipRepository, RevocationRepository, RoleRepository,
    StudentRepository,
};
use kydohub_entity::membership::{Membership, MembershipAttributes};
use kydohub_entity::role::Role;
use kydohub_entity::student::Student;

/// Origin every test browser request claims.
pub const ORIGIN: &str = "http://localhost:5173";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Wired application state
    pub state: AppState,
    /// Backing in-memory database
    pub db: MemoryDatabase,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application over memory store and cache.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application with a custom configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        let cache = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        Self::build(config, cache, |_| {}).await
    }

    /// Create a test application with a custom cache provider and store tweaks.
    pub async fn build(
        config: AppConfig,
        cache: Arc<dyn CacheProvider>,
        customize: impl FnOnce(&mut Store),
    ) -> Self {
        let db = MemoryDatabase::new();
        seed_template_roles(&db).await;

        let mut store = Store::memory(db.clone());
        customize(&mut store);

        let cache = Arc::new(CacheManager::from_provider(cache));
        let state = build_state(config.clone(), store, cache).expect("Failed to build state");
        let router = build_app(state.clone());

        Self {
            router,
            state,
            db,
            config,
        }
    }

    /// Add an active member with the given roles and attributes.
    pub async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[&str],
        attrs: MembershipAttributes,
    ) {
        let membership = Membership::active(
            tenant_id,
            user_id,
            roles.iter().map(|r| r.to_string()).collect(),
            attrs,
        );
        MembershipRepository::upsert(&self.db, &membership)
            .await
            .expect("Failed to add member");
        EntitlementRepository::ensure_baseline(&self.db, tenant_id, user_id)
            .await
            .expect("Failed to seed EV");
    }

    /// Add a teacher assigned to `rooms`.
    pub async fn add_teacher(&self, tenant_id: TenantId, user_id: UserId, rooms: &[&str]) {
        let attrs = MembershipAttributes {
            rooms: rooms.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        self.add_member(tenant_id, user_id, &["teacher"], attrs).await;
    }

    /// Add a tenant administrator.
    pub async fn add_admin(&self, tenant_id: TenantId, user_id: UserId) {
        self.add_member(tenant_id, user_id, &["admin"], MembershipAttributes::default())
            .await;
    }

    /// Add a student row.
    pub async fn add_student(&self, tenant_id: TenantId, id: &str, name: &str, room: &str) {
        let student = Student {
            id: id.to_string(),
            tenant_id,
            full_name: name.to_string(),
            room_id: room.to_string(),
            created_at: Utc::now(),
        };
        StudentRepository::upsert(&self.db, &student)
            .await
            .expect("Failed to add student");
    }

    /// Mint an access token with the member's stored EV.
    pub async fn token(&self, tenant_id: TenantId, user_id: UserId) -> String {
        let ev = EntitlementRepository::ensure_baseline(&self.db, tenant_id, user_id)
            .await
            .expect("Failed to read EV");
        self.token_with_ev(tenant_id, user_id, ev)
    }

    /// Mint an access token carrying an explicit EV.
    pub fn token_with_ev(&self, tenant_id: TenantId, user_id: UserId, ev: i64) -> String {
        TokenCodec::new(&self.config.auth)
            .expect("Failed to build codec")
            .mint(tenant_id, user_id, ev)
            .expect("Failed to mint token")
            .0
    }

    /// A token the configured identity provider would have issued.
    pub fn identity_token(&self, user_id: UserId) -> String {
        use jsonwebtoken::{EncodingKey, Header, encode};

        let idp = &self.config.auth.identity_provider;
        let claims = serde_json::json!({
            "sub": user_id.to_string(),
            "exp": Utc::now().timestamp() + 600,
            "iss": idp.issuer,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(idp.jwt_secret.as_bytes()),
        )
        .expect("Failed to sign identity token")
    }

    /// Exchange an identity token as a mobile client and return the session body.
    pub async fn mobile_session(&self, tenant_id: TenantId, user_id: UserId) -> Value {
        let response = self
            .send(
                json_request("POST", "/api/auth/exchange")
                    .header("x-client", "mobile")
                    .body(Body::from(
                        serde_json::json!({
                            "provider": "supabase",
                            "token": self.identity_token(user_id),
                            "tenantHint": tenant_id,
                        })
                        .to_string(),
                    ))
                    .expect("Failed to build request"),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "exchange failed: {:?}", response.body);
        response.body["data"].clone()
    }

    /// Send a JSON request with an optional bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = json_request(method, path);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a fully built request.
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Error code of an error envelope.
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// `Set-Cookie` value for `name`, without attributes.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookie_line(name)
            .and_then(|line| line.split(';').next().map(str::to_string))
            .and_then(|pair| pair.split_once('=').map(|(_, v)| v.to_string()))
    }

    /// Full `Set-Cookie` line for `name`.
    pub fn set_cookie_line(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }

    /// Map the response to the error a client would raise.
    pub fn into_result(self) -> AppResult<Value> {
        if self.status.is_success() {
            return Ok(self.body);
        }
        let message = self.body["message"].as_str().unwrap_or_default().to_string();
        let kind = match self.error_code() {
            Some("EV_OUTDATED") => ErrorKind::StalePermissions,
            Some("TOKEN_EXPIRED") => ErrorKind::TokenExpired,
            Some("UNAUTHENTICATED") => ErrorKind::Unauthenticated,
            Some("PERMISSION_DENIED") => ErrorKind::PermissionDenied,
            Some("RATE_LIMITED") => ErrorKind::RateLimited,
            Some("DEPENDENCY_UNAVAILABLE") => ErrorKind::DependencyUnavailable,
            _ => ErrorKind::Internal,
        };
        Err(AppError::new(kind, message))
    }
}

/// Configuration used by most tests: memory backends, generous rate limit.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.provider = "memory".to_string();
    config.cache.provider = "memory".to_string();
    config.rate_limit.burst = 1_000;
    config.rate_limit.per_minute = 1_000;
    config
}

/// Builder for a JSON request.
pub fn json_request(method: &str, path: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json")
}

/// `Cookie` header value from name/value pairs.
pub fn cookie_header(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn seed_template_roles(db: &MemoryDatabase) {
    for (name, perms) in [
        ("teacher", &["students.view", "students.list_room"][..]),
        ("guardian", &["students.view", "students.list_guardian"][..]),
        (
            "admin",
            &[
                "students.view",
                "students.list_all",
                "users.manage",
                "roles.manage",
            ][..],
        ),
    ] {
        RoleRepository::upsert(
            db,
            &Role::new(None, name, perms.iter().map(|p| p.to_string()).collect()),
        )
        .await
        .expect("Failed to seed role");
    }
}

/// Cache whose every call fails.
#[derive(Debug, Default)]
pub struct DownCache;

#[async_trait]
impl CacheProvider for DownCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::cache("cache down"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        Err(AppError::cache("cache down"))
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache("cache down"))
    }

    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Err(AppError::cache("cache down"))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

/// Revocation repository whose every call fails.
#[derive(Debug, Default)]
pub struct DownRevocations;

#[async_trait]
impl RevocationRepository for DownRevocations {
    async fn insert(&self, _jti: TokenId, _expires_at: DateTime<Utc>) -> AppResult<()> {
        Err(AppError::database("revocations down"))
    }

    async fn is_revoked(&self, _jti: TokenId, _now: DateTime<Utc>) -> AppResult<bool> {
        Err(AppError::database("revocations down"))
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> AppResult<u64> {
        Err(AppError::database("revocations down"))
    }
}
