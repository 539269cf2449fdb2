//! Token codec failures.

use thiserror::Error;

use kydohub_core::error::{AppError, ErrorKind};

/// Why a token could not be issued or verified.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, structure, audience, issuer, or a required claim is wrong.
    #[error("invalid token: {0}")]
    Invalid(String),
    /// The token is past its expiry, beyond the clock-skew tolerance.
    #[error("token expired")]
    Expired,
    /// Key material could not be loaded.
    #[error("invalid signing key: {0}")]
    Key(String),
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::token_expired("Session expired"),
            TokenError::Invalid(_) => {
                AppError::with_source(ErrorKind::Unauthenticated, "Invalid session", err)
            }
            TokenError::Key(_) => {
                AppError::with_source(ErrorKind::Configuration, "Token key unavailable", err)
            }
            TokenError::Signing(_) => {
                AppError::with_source(ErrorKind::Internal, "Failed to issue token", err)
            }
        }
    }
}
