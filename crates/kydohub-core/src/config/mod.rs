//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default, so an empty source yields
//! a usable development configuration.

pub mod app;
pub mod auth;
pub mod authorization;
pub mod cache;
pub mod cookies;
pub mod database;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::authorization::AuthorizationConfig;
use self::cache::CacheConfig;
use self::cookies::CookieConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::rate_limit::RateLimitConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Primary database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Token signing and verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Permission cache, EV cache, and scope settings.
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    /// Browser cookie and CSRF settings.
    #[serde(default)]
    pub cookies: CookieConfig,
    /// Rate limiting for the session-lifecycle endpoints.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `KYDOHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KYDOHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject combinations that would make the guard pipeline unsound.
    pub fn validate(&self) -> Result<(), AppError> {
        self.auth.validate()?;
        if self.authorization.max_concurrent_recompute == 0 {
            return Err(AppError::configuration(
                "authorization.max_concurrent_recompute must be at least 1",
            ));
        }
        if self.authorization.unrestricted_suffix.trim().is_empty() {
            return Err(AppError::configuration(
                "authorization.unrestricted_suffix must not be empty",
            ));
        }
        Ok(())
    }
}

/// Connection URL with any password dropped, for logs.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}@{host}")
        }
        None => url.to_string(),
    }
}
