//! Request DTOs with validation.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use kydohub_core::error::AppError;
use kydohub_core::types::TenantId;

use crate::error::ApiError;
use crate::extractors::client::ClientKind;

/// Identity provider token exchange.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExchangeRequest {
    /// Identity provider name; only one is configured.
    #[serde(default)]
    pub provider: Option<String>,
    /// Identity provider access token.
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    /// Tenant to open the session in.
    #[serde(default, rename = "tenantHint")]
    pub tenant_hint: Option<TenantId>,
    /// Free-form device label stored with the refresh session.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub device: Option<String>,
    /// Client mode when no `X-Client` header is sent.
    #[serde(default)]
    pub client: Option<ClientKind>,
}

/// Refresh token rotation. Web clients send the refresh cookie instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token (mobile).
    #[serde(default)]
    pub refresh: Option<String>,
    /// Client mode when no `X-Client` header is sent.
    #[serde(default)]
    pub client: Option<ClientKind>,
}

/// Logout. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke (mobile).
    #[serde(default)]
    pub refresh: Option<String>,
    /// Client mode when no `X-Client` header is sent.
    #[serde(default)]
    pub client: Option<ClientKind>,
}

/// Switch the session to another tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchRequest {
    /// Target tenant.
    #[serde(rename = "tenantId")]
    pub tenant_id: TenantId,
    /// Client mode when no `X-Client` header is sent.
    #[serde(default)]
    pub client: Option<ClientKind>,
}

/// Replace a member's roles.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRolesRequest {
    /// New role names.
    #[validate(length(max = 32, message = "Too many roles"))]
    pub roles: Vec<String>,
}

/// Run `validator` rules and map failures to a `Validation` error.
pub fn validated<T: Validate>(body: T) -> Result<T, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(body)
}

/// Parse an optional JSON body; an empty body yields the default.
pub fn optional_json<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::validation(format!("Invalid request body: {e}")).into())
}
