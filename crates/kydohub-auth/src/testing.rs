//! Fault-injecting doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::traits::CacheProvider;
use kydohub_core::types::{TenantId, TokenId, UserId};
use kydohub_database::repositories::memory::MemoryDatabase;
use kydohub_database::repositories::{EntitlementRepository, RevocationRepository};

/// A string cache that fails every call while `down` is set. TTLs are ignored.
#[derive(Debug, Default)]
pub struct FlakyCache {
    down: AtomicBool,
    entries: Mutex<HashMap<String, String>>,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::cache("cache unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheProvider for FlakyCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        self.check()?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.check()?;
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.down.load(Ordering::SeqCst))
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Revocation repository over [`MemoryDatabase`] that can be switched off.
#[derive(Debug)]
pub struct FlakyRevocations {
    down: AtomicBool,
    inner: MemoryDatabase,
}

impl FlakyRevocations {
    pub fn new(inner: MemoryDatabase) -> Self {
        Self {
            down: AtomicBool::new(false),
            inner,
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::database("database unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RevocationRepository for FlakyRevocations {
    async fn insert(&self, jti: TokenId, expires_at: DateTime<Utc>) -> AppResult<()> {
        self.check()?;
        self.inner.insert(jti, expires_at).await
    }

    async fn is_revoked(&self, jti: TokenId, now: DateTime<Utc>) -> AppResult<bool> {
        self.check()?;
        self.inner.is_revoked(jti, now).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.check()?;
        RevocationRepository::purge_expired(&self.inner, now).await
    }
}

/// Entitlement repository over [`MemoryDatabase`] that can be switched off.
#[derive(Debug)]
pub struct FlakyEntitlements {
    down: AtomicBool,
    inner: MemoryDatabase,
}

impl FlakyEntitlements {
    pub fn new(inner: MemoryDatabase) -> Self {
        Self {
            down: AtomicBool::new(false),
            inner,
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::database("database unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EntitlementRepository for FlakyEntitlements {
    async fn current(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<i64>> {
        self.check()?;
        self.inner.current(tenant_id, user_id).await
    }

    async fn ensure_baseline(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        self.check()?;
        self.inner.ensure_baseline(tenant_id, user_id).await
    }

    async fn bump(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        self.check()?;
        self.inner.bump(tenant_id, user_id).await
    }
}

/// Shorthand for an `Arc<CacheManager>` over a fresh [`FlakyCache`].
pub fn flaky_cache() -> (Arc<kydohub_cache::CacheManager>, Arc<FlakyCache>) {
    let cache = Arc::new(FlakyCache::new());
    (
        Arc::new(kydohub_cache::CacheManager::from_provider(cache.clone())),
        cache,
    )
}

/// Entitlement source that counts calls and tracks its own peak parallelism.
#[derive(Debug)]
pub struct CountingSource {
    delay: Duration,
    calls: std::sync::atomic::AtomicUsize,
    running: std::sync::atomic::AtomicUsize,
    peak: std::sync::atomic::AtomicUsize,
    failing: AtomicBool,
}

impl CountingSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Default::default(),
            running: Default::default(),
            peak: Default::default(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl crate::resolver::EntitlementSource for CountingSource {
    async fn resolve(
        &self,
        _tenant_id: TenantId,
        _user_id: UserId,
    ) -> AppResult<crate::resolver::Entitlements> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::database("database unreachable"));
        }
        Ok(crate::resolver::Entitlements {
            roles: vec!["teacher".to_string()],
            permissions: ["students.view", "students.list_room"]
                .into_iter()
                .map(String::from)
                .collect(),
            attrs: Default::default(),
        })
    }
}

/// A fully wired in-memory pipeline with fault switches on the cache and
/// the revocation repository.
pub struct Harness {
    pub db: MemoryDatabase,
    pub store: kydohub_database::Store,
    pub flaky_cache: Arc<FlakyCache>,
    pub flaky_revocations: Arc<FlakyRevocations>,
    pub codec: Arc<crate::token::TokenCodec>,
    pub revocations: crate::revocation::RevocationStore,
    pub versions: crate::entitlement::EvStore,
    pub permsets: crate::permset::PermissionCache,
    pub guard: crate::guard::Guard,
    pub sessions: crate::session::SessionManager,
    pub admin: crate::admin::AccessAdmin,
}

impl Harness {
    pub async fn new() -> Self {
        use kydohub_core::config::auth::AuthConfig;
        use kydohub_core::config::authorization::AuthorizationConfig;
        use kydohub_database::repositories::RoleRepository;
        use kydohub_entity::role::Role;

        let db = MemoryDatabase::new();
        for (name, perms) in [
            ("teacher", &["students.view", "students.list_room"][..]),
            ("guardian", &["students.view", "students.list_guardian"][..]),
            (
                "admin",
                &["students.view", "students.list_all", "users.manage", "roles.manage"][..],
            ),
        ] {
            RoleRepository::upsert(
                &db,
                &Role::new(None, name, perms.iter().map(|p| p.to_string()).collect()),
            )
            .await
            .unwrap();
        }

        let flaky_revocations = Arc::new(FlakyRevocations::new(db.clone()));
        let mut store = kydohub_database::Store::memory(db.clone());
        store.revocations = flaky_revocations.clone();

        let (cache, flaky_cache) = flaky_cache();
        let auth = AuthConfig::default();
        let authz = AuthorizationConfig::default();
        let codec = Arc::new(crate::token::TokenCodec::new(&auth).unwrap());
        let revocations =
            crate::revocation::RevocationStore::new(cache.clone(), store.revocations.clone(), &authz);
        let versions =
            crate::entitlement::EvStore::new(cache.clone(), store.entitlements.clone(), &authz);
        let resolver = Arc::new(crate::resolver::MembershipResolver::new(
            store.memberships.clone(),
            store.roles.clone(),
        ));
        let permsets = crate::permset::PermissionCache::new(cache, resolver, &authz);
        let guard = crate::guard::Guard::new(
            codec.clone(),
            revocations.clone(),
            versions.clone(),
            permsets.clone(),
            crate::scope::ScopeBuilder::new(&authz),
        );
        let sessions = crate::session::SessionManager::new(
            &auth,
            codec.clone(),
            &store,
            revocations.clone(),
            versions.clone(),
            permsets.clone(),
        );
        let admin = crate::admin::AccessAdmin::new(&store, versions.clone(), permsets.clone());

        Self {
            db,
            store,
            flaky_cache,
            flaky_revocations,
            codec,
            revocations,
            versions,
            permsets,
            guard,
            sessions,
            admin,
        }
    }

    pub async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[&str],
        attrs: kydohub_entity::membership::MembershipAttributes,
    ) {
        use kydohub_database::repositories::MembershipRepository;

        let membership = kydohub_entity::membership::Membership::active(
            tenant_id,
            user_id,
            roles.iter().map(|r| r.to_string()).collect(),
            attrs,
        );
        MembershipRepository::upsert(&self.db, &membership).await.unwrap();
        self.versions.seed(tenant_id, user_id).await.unwrap();
    }

    pub async fn add_teacher(&self, tenant_id: TenantId, user_id: UserId, rooms: &[&str]) {
        let attrs = kydohub_entity::membership::MembershipAttributes {
            rooms: rooms.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        self.add_member(tenant_id, user_id, &["teacher"], attrs).await;
    }

    pub async fn add_admin(&self, tenant_id: TenantId, user_id: UserId) {
        self.add_member(tenant_id, user_id, &["admin"], Default::default())
            .await;
    }

    /// Mint an access token carrying the member's current EV.
    pub async fn token(&self, tenant_id: TenantId, user_id: UserId) -> String {
        let ev = self.versions.seed(tenant_id, user_id).await.unwrap();
        self.codec.mint(tenant_id, user_id, ev).unwrap().0
    }

    /// A provider token the session manager accepts for `user_id`.
    pub fn identity_token(&self, user_id: UserId) -> String {
        use jsonwebtoken::{EncodingKey, Header, encode};
        use kydohub_core::config::auth::IdentityProviderConfig;

        let config = IdentityProviderConfig::default();
        let claims = crate::token::IdentityClaims {
            sub: user_id.to_string(),
            email: None,
            exp: Utc::now().timestamp() + 600,
            iss: config.issuer.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap()
    }
}
