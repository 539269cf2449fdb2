//! Client mode selection.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Header naming the client kind.
pub const CLIENT_HEADER: &str = "x-client";

/// How a client carries its session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// Browser: cookies plus CSRF token.
    #[default]
    Web,
    /// Native app: tokens in the JSON body.
    Mobile,
}

impl ClientKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" => Some(Self::Web),
            "mobile" => Some(Self::Mobile),
            _ => None,
        }
    }
}

/// The `X-Client` header, when present and recognised.
#[derive(Debug, Clone, Copy, Default)]
pub struct Client(pub Option<ClientKind>);

impl Client {
    /// Header first, then the body's `client` field, then web.
    pub fn resolve(self, body: Option<ClientKind>) -> ClientKind {
        self.0.or(body).unwrap_or_default()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Client(
            parts
                .headers
                .get(CLIENT_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(ClientKind::parse),
        ))
    }
}
