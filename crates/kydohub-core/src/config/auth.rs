//! Token signing and verification configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing algorithm for session tokens: `"HS256"` or `"RS256"`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Shared secret for HS256 session tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// PEM-encoded RSA private key for RS256 signing.
    #[serde(default)]
    pub private_key_pem: Option<String>,
    /// PEM-encoded RSA public key for RS256 verification.
    #[serde(default)]
    pub public_key_pem: Option<String>,
    /// Key id placed in the token header when set.
    #[serde(default)]
    pub key_id: Option<String>,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Refresh session lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: u64,
    /// Clock-skew tolerance applied to `exp` and `iat`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// External identity provider accepted at the exchange endpoint.
    #[serde(default)]
    pub identity_provider: IdentityProviderConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            jwt_secret: default_jwt_secret(),
            private_key_pem: None,
            public_key_pem: None,
            key_id: None,
            issuer: default_issuer(),
            audience: default_audience(),
            access_ttl_seconds: default_access_ttl(),
            refresh_ttl_seconds: default_refresh_ttl(),
            leeway_seconds: default_leeway(),
            identity_provider: IdentityProviderConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Check that the configured algorithm has the key material it needs.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.algorithm.as_str() {
            "HS256" => {
                if self.jwt_secret.len() < 32 {
                    return Err(AppError::configuration(
                        "auth.jwt_secret must be at least 32 bytes for HS256",
                    ));
                }
            }
            "RS256" => {
                if self.private_key_pem.is_none() || self.public_key_pem.is_none() {
                    return Err(AppError::configuration(
                        "auth.private_key_pem and auth.public_key_pem are required for RS256",
                    ));
                }
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unsupported auth.algorithm '{other}'"
                )));
            }
        }
        if self.access_ttl_seconds == 0 || self.refresh_ttl_seconds <= self.access_ttl_seconds {
            return Err(AppError::configuration(
                "auth.refresh_ttl_seconds must exceed a non-zero auth.access_ttl_seconds",
            ));
        }
        Ok(())
    }
}

/// External identity provider whose tokens are exchanged for sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    /// HS256 secret used by the provider to sign its access tokens.
    #[serde(default = "default_idp_secret")]
    pub jwt_secret: String,
    /// Expected `iss` claim of provider tokens.
    #[serde(default = "default_idp_issuer")]
    pub issuer: String,
    /// Expected `aud` claim of provider tokens, when the provider sets one.
    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_idp_secret(),
            issuer: default_idp_issuer(),
            audience: None,
        }
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION_0123456789abcdef".to_string()
}

fn default_issuer() -> String {
    "kydohub".to_string()
}

fn default_audience() -> String {
    "kydohub-api".to_string()
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_leeway() -> u64 {
    120
}

fn default_idp_secret() -> String {
    "CHANGE_ME_IDP_SECRET_0123456789abcdef".to_string()
}

fn default_idp_issuer() -> String {
    "http://localhost:54321/auth/v1".to_string()
}
