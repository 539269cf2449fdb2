//! CSRF double-submit check for cookie-authenticated requests.
//!
//! A cookie-borne credential on an unsafe method must come from an allowed
//! origin and carry a CSRF header equal to the CSRF cookie.

use axum::http::{HeaderMap, Method, header};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use kydohub_core::config::cookies::CookieConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;

use crate::cookies;

/// Neutral message for a failed CSRF check.
pub const CSRF_MESSAGE: &str = "Request could not be verified.";

/// Whether `method` can change state.
pub fn is_unsafe(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Run the origin and double-submit checks.
pub fn verify(headers: &HeaderMap, config: &CookieConfig) -> AppResult<()> {
    let origin = request_origin(headers);
    let origin_ok = origin
        .as_deref()
        .is_some_and(|o| config.allowed_origins.iter().any(|allowed| allowed == o));
    if !origin_ok {
        warn!(event = "csrf_rejected", reason = "origin", origin = ?origin, "CSRF check failed");
        return Err(AppError::permission_denied(CSRF_MESSAGE));
    }

    let jar = CookieJar::from_headers(headers);
    let cookie = cookies::read(&jar, &config.csrf_name);
    let header = headers
        .get(config.csrf_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (cookie, header) {
        (Some(cookie), Some(header)) if constant_time_eq(cookie.as_bytes(), header.as_bytes()) => {
            Ok(())
        }
        _ => {
            warn!(event = "csrf_rejected", reason = "token", "CSRF check failed");
            Err(AppError::permission_denied(CSRF_MESSAGE))
        }
    }
}

/// `Origin`, or the origin part of `Referer`.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        return Some(origin.trim_end_matches('/').to_string());
    }
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let (scheme, rest) = referer.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
