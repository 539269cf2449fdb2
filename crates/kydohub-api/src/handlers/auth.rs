//! Session lifecycle handlers: exchange, refresh, logout, switch.
//!
//! Web clients get cookies and an empty 204; mobile clients get the token
//! pair as JSON.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use kydohub_auth::guard::orchestrator::AUTH_REQUIRED_MESSAGE;
use kydohub_auth::{ExchangeOutcome, IssuedSession};
use kydohub_core::error::AppError;

use crate::cookies;
use crate::dto::request::{
    ExchangeRequest, LogoutRequest, RefreshRequest, SwitchRequest, optional_json, validated,
};
use crate::dto::response::{ApiResponse, SessionTokensResponse, TenantChoice, TenantChoiceResponse};
use crate::error::ApiError;
use crate::extractors::client::{Client, ClientKind};
use crate::extractors::credential::Credential;
use crate::middleware::csrf;
use crate::state::AppState;

/// Non-standard status telling the client to pick a tenant.
pub const TENANT_CHOICE_STATUS: u16 = 209;

/// POST /api/auth/exchange
pub async fn exchange(
    State(state): State<AppState>,
    client: Client,
    jar: CookieJar,
    Json(req): Json<ExchangeRequest>,
) -> Result<Response, ApiError> {
    let req = validated(req)?;
    let kind = client.resolve(req.client);

    match state
        .sessions
        .exchange(&req.token, req.tenant_hint, req.device.clone())
        .await?
    {
        ExchangeOutcome::Issued(issued) => Ok(session_response(&state, jar, kind, issued)),
        ExchangeOutcome::ChooseTenant(tenants) => {
            let status = StatusCode::from_u16(TENANT_CHOICE_STATUS).unwrap_or(StatusCode::OK);
            let body = TenantChoiceResponse {
                tenants: tenants
                    .into_iter()
                    .map(|tenant_id| TenantChoice { tenant_id })
                    .collect(),
            };
            Ok((status, Json(ApiResponse::ok(body))).into_response())
        }
    }
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    client: Client,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: RefreshRequest = optional_json(&body)?;
    let kind = client.resolve(req.client);
    let config = &state.config.cookies;

    let presented = match kind {
        ClientKind::Web => {
            let token = cookies::read(&jar, &config.refresh_name)
                .ok_or_else(|| AppError::unauthenticated(AUTH_REQUIRED_MESSAGE))?;
            csrf::verify(&headers, config)?;
            token
        }
        ClientKind::Mobile => req
            .refresh
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthenticated(AUTH_REQUIRED_MESSAGE))?,
    };

    let issued = state.sessions.refresh(&presented).await?;
    Ok(session_response(&state, jar, kind, issued))
}

/// POST /api/auth/logout
///
/// Always 204 once the access token revocation is durable.
pub async fn logout(
    State(state): State<AppState>,
    client: Client,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: LogoutRequest = optional_json(&body)?;
    let kind = client.resolve(req.client);
    let config = &state.config.cookies;

    let credential = Credential::from_headers(&headers, config);
    let cookie_refresh = cookies::read(&jar, &config.refresh_name);
    let uses_cookies = credential.as_ref().is_some_and(|c| c.from_cookie) || cookie_refresh.is_some();
    if kind == ClientKind::Web && uses_cookies {
        csrf::verify(&headers, config)?;
    }

    let refresh = req.refresh.or(cookie_refresh);
    state
        .sessions
        .logout(
            credential.as_ref().map(|c| c.token.as_str()),
            refresh.as_deref(),
        )
        .await?;

    match kind {
        ClientKind::Web => Ok((cookies::clear_session(jar, config), StatusCode::NO_CONTENT).into_response()),
        ClientKind::Mobile => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /api/auth/switch
pub async fn switch(
    State(state): State<AppState>,
    client: Client,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<SwitchRequest>,
) -> Result<Response, ApiError> {
    let kind = client.resolve(req.client);
    let config = &state.config.cookies;

    let credential = Credential::from_headers(&headers, config)
        .ok_or_else(|| AppError::unauthenticated(AUTH_REQUIRED_MESSAGE))?;
    if credential.from_cookie {
        csrf::verify(&headers, config)?;
    }

    let issued = state
        .sessions
        .switch_tenant(&credential.token, req.tenant_id)
        .await?;
    Ok(session_response(&state, jar, kind, issued))
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    kind: ClientKind,
    issued: IssuedSession,
) -> Response {
    match kind {
        ClientKind::Web => {
            let jar = cookies::set_session(jar, &state.config.cookies, &issued);
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        ClientKind::Mobile => {
            Json(ApiResponse::ok(SessionTokensResponse::from(issued))).into_response()
        }
    }
}
