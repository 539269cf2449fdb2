//! Locating the session credential on a request.

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;

use kydohub_core::config::cookies::CookieConfig;

use crate::cookies;

/// An access token and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Raw token.
    pub token: String,
    /// Whether it came from the session cookie rather than a header.
    pub from_cookie: bool,
}

impl Credential {
    /// Bearer header first, then the access cookie.
    pub fn from_headers(headers: &HeaderMap, config: &CookieConfig) -> Option<Self> {
        if let Some(token) = bearer(headers) {
            return Some(Self {
                token,
                from_cookie: false,
            });
        }
        let jar = CookieJar::from_headers(headers);
        cookies::read(&jar, &config.access_name).map(|token| Self {
            token,
            from_cookie: true,
        })
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
