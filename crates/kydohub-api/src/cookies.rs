//! Session cookies for browser clients.
//!
//! Three cookies travel with a web session: the access token and the
//! refresh token, both HttpOnly, and a readable CSRF token the frontend
//! echoes in a header on unsafe requests.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;

use kydohub_auth::IssuedSession;
use kydohub_core::config::cookies::CookieConfig;

/// A fresh random CSRF token.
pub fn new_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Add the access, refresh and CSRF cookies for an issued session.
pub fn set_session(jar: CookieJar, config: &CookieConfig, session: &IssuedSession) -> CookieJar {
    let now = Utc::now();
    let access = build(
        config,
        config.access_name.clone(),
        session.access_token.clone(),
        "/".to_string(),
        true,
        Some(max_age(session.access_expires_at, now)),
    );
    let refresh = build(
        config,
        config.refresh_name.clone(),
        session.refresh_token.clone(),
        config.refresh_path.clone(),
        true,
        Some(max_age(session.refresh_expires_at, now)),
    );
    let csrf = build(
        config,
        config.csrf_name.clone(),
        new_csrf_token(),
        "/".to_string(),
        false,
        Some(max_age(session.refresh_expires_at, now)),
    );
    jar.add(access).add(refresh).add(csrf)
}

/// Remove every session cookie.
pub fn clear_session(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    let removals = [
        (config.access_name.clone(), "/".to_string()),
        (config.refresh_name.clone(), config.refresh_path.clone()),
        (config.csrf_name.clone(), "/".to_string()),
    ];
    removals.into_iter().fold(jar, |jar, (name, path)| {
        jar.remove(build(config, name, String::new(), path, true, None))
    })
}

/// Value of a named cookie, if present and non-empty.
pub fn read(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

fn build(
    config: &CookieConfig,
    name: String,
    value: String,
    path: String,
    http_only: bool,
    max_age: Option<time::Duration>,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path(path)
        .http_only(http_only)
        .secure(config.secure)
        .same_site(SameSite::Lax);
    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

fn max_age(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> time::Duration {
    time::Duration::seconds((expires_at - now).num_seconds().max(0))
}
