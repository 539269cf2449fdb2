//! Browser cookie and CSRF configuration.

use serde::{Deserialize, Serialize};

/// Names and attributes of the session cookies handed to web clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Access token cookie (HttpOnly, path `/`).
    #[serde(default = "default_access_name")]
    pub access_name: String,
    /// Refresh token cookie (HttpOnly, path-scoped).
    #[serde(default = "default_refresh_name")]
    pub refresh_name: String,
    /// Anti-forgery cookie, readable by scripts.
    #[serde(default = "default_csrf_name")]
    pub csrf_name: String,
    /// Header that must echo the anti-forgery cookie on unsafe methods.
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
    /// Path the refresh cookie is scoped to.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Cookie domain; host-only when unset.
    #[serde(default)]
    pub domain: Option<String>,
    /// Whether cookies carry the `Secure` attribute.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Origins allowed to send credentialed unsafe requests.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_name: default_access_name(),
            refresh_name: default_refresh_name(),
            csrf_name: default_csrf_name(),
            csrf_header: default_csrf_header(),
            refresh_path: default_refresh_path(),
            domain: None,
            secure: default_secure(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_access_name() -> String {
    "kydo_sess".to_string()
}

fn default_refresh_name() -> String {
    "kydo_refresh".to_string()
}

fn default_csrf_name() -> String {
    "kydo_csrf".to_string()
}

fn default_csrf_header() -> String {
    "x-csrf-token".to_string()
}

fn default_refresh_path() -> String {
    "/api/auth/refresh".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}
