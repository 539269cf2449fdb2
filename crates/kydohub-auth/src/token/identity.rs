//! Verification of identity provider access tokens at the exchange endpoint.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use kydohub_core::config::auth::IdentityProviderConfig;
use kydohub_core::types::UserId;

use super::error::TokenError;

/// The subset of provider claims the exchange consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Provider user id (a UUID).
    pub sub: String,
    /// Email, when the provider includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

impl IdentityClaims {
    /// Parse the subject into a user id.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }
}

/// Verifies HS256 tokens minted by the external identity provider.
///
/// Used once per session exchange; provider tokens are never accepted on
/// ordinary requests.
#[derive(Clone)]
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

impl IdentityVerifier {
    /// Build a verifier from the identity provider configuration.
    pub fn new(config: &IdentityProviderConfig, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.set_issuer(&[config.issuer.as_str()]);
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a provider token and return its claims.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let claims = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?.claims;
        claims.user_id()?;
        Ok(claims)
    }
}
