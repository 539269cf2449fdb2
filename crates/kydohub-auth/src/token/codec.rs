//! Session token signing and verification.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};

use kydohub_core::config::auth::AuthConfig;
use kydohub_core::types::{TenantId, TokenId, UserId};

use super::claims::Claims;
use super::error::TokenError;

/// Claims a session token must carry to be accepted.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "sub", "aud", "iss"];

/// Signs and verifies KydoHub session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    /// Header template (algorithm and optional key id).
    header: Header,
    /// Signing key.
    encoding_key: EncodingKey,
    /// Verification key.
    decoding_key: DecodingKey,
    /// Validation rules applied on verify.
    validation: Validation,
    /// Expected issuer.
    issuer: String,
    /// Expected audience.
    audience: String,
    /// Access token lifetime.
    access_ttl: Duration,
    /// Clock-skew tolerance in seconds.
    leeway: i64,
    /// Published verification keys; empty for shared-secret signing.
    jwks: JwkSet,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.header.alg)
            .field("kid", &self.header.kid)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl TokenCodec {
    /// Build a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let (algorithm, encoding_key, decoding_key, kid) = match config.algorithm.as_str() {
            "HS256" => (
                Algorithm::HS256,
                EncodingKey::from_secret(config.jwt_secret.as_bytes()),
                DecodingKey::from_secret(config.jwt_secret.as_bytes()),
                config.key_id.clone(),
            ),
            "RS256" => {
                let private = config
                    .private_key_pem
                    .as_deref()
                    .ok_or_else(|| TokenError::Key("missing RS256 private key".to_string()))?;
                let public = config
                    .public_key_pem
                    .as_deref()
                    .ok_or_else(|| TokenError::Key("missing RS256 public key".to_string()))?;
                (
                    Algorithm::RS256,
                    EncodingKey::from_rsa_pem(private.as_bytes())
                        .map_err(|e| TokenError::Key(e.to_string()))?,
                    DecodingKey::from_rsa_pem(public.as_bytes())
                        .map_err(|e| TokenError::Key(e.to_string()))?,
                    Some(match &config.key_id {
                        Some(kid) => kid.clone(),
                        None => derive_key_id(public)?,
                    }),
                )
            }
            other => return Err(TokenError::Key(format!("unsupported algorithm '{other}'"))),
        };

        let jwks = match algorithm {
            Algorithm::RS256 => {
                let mut jwk = Jwk::from_encoding_key(&encoding_key, algorithm)
                    .map_err(|e| TokenError::Key(e.to_string()))?;
                jwk.common.public_key_use = Some(PublicKeyUse::Signature);
                jwk.common.key_id = kid.clone();
                JwkSet { keys: vec![jwk] }
            }
            _ => JwkSet { keys: Vec::new() },
        };

        let mut header = Header::new(algorithm);
        header.kid = kid;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);

        Ok(Self {
            header,
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: Duration::seconds(config.access_ttl_seconds as i64),
            leeway: config.leeway_seconds as i64,
            jwks,
        })
    }

    /// Public keys other services can verify session tokens with.
    pub fn jwks(&self) -> &JwkSet {
        &self.jwks
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Build fresh claims for a member with a new token id.
    pub fn claims_for(&self, tenant_id: TenantId, user_id: UserId, ev: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user_id,
            tid: tenant_id,
            ev,
            jti: TokenId::new(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
        }
    }

    /// Sign the given claims.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Mint a new access token for a member, returning the token and its claims.
    pub fn mint(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ev: i64,
    ) -> Result<(String, Claims), TokenError> {
        let claims = self.claims_for(tenant_id, user_id, ev);
        let token = self.issue(&claims)?;
        Ok((token, claims))
    }

    /// Verify signature, expiry (with leeway), audience, issuer and claim presence.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Invalid("empty token".to_string()));
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.iat > Utc::now().timestamp() + self.leeway {
            return Err(TokenError::Invalid("issued in the future".to_string()));
        }
        if claims.ev < 1 {
            return Err(TokenError::Invalid("entitlement version out of range".to_string()));
        }

        Ok(claims)
    }
}

/// `base64url(sha256(SubjectPublicKeyInfo DER))`, first 16 characters.
fn derive_key_id(public_pem: &str) -> Result<String, TokenError> {
    let body: String = public_pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    let der = STANDARD
        .decode(body)
        .map_err(|e| TokenError::Key(format!("malformed public key: {e}")))?;
    let mut kid = URL_SAFE_NO_PAD.encode(Sha256::digest(&der));
    kid.truncate(16);
    Ok(kid)
}
