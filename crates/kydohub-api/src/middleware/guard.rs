//! Per-route authorization middleware.
//!
//! Each protected route carries its own [`RouteRequirement`]. The layer
//! finds the credential, runs the CSRF check for cookie credentials on
//! unsafe methods, runs the guard, and stores the resulting
//! [`AuthContext`](kydohub_auth::AuthContext) in the request extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use kydohub_auth::RouteRequirement;

use crate::error::ApiError;
use crate::extractors::credential::Credential;
use crate::middleware::{csrf, request_id};
use crate::state::AppState;

/// State of one guarded route.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    state: AppState,
    requirement: Arc<RouteRequirement>,
}

impl RouteGuard {
    /// Guard for `requirement`.
    pub fn new(state: AppState, requirement: RouteRequirement) -> Self {
        Self {
            state,
            requirement: Arc::new(requirement),
        }
    }
}

/// Authorize the request or end it with the guard's error.
pub async fn enforce(
    State(route): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookies = &route.state.config.cookies;
    let credential = Credential::from_headers(request.headers(), cookies);

    if credential.as_ref().is_some_and(|c| c.from_cookie) && csrf::is_unsafe(request.method()) {
        csrf::verify(request.headers(), cookies)?;
    }

    let ctx = route
        .state
        .guard
        .authorize(
            credential.as_ref().map(|c| c.token.as_str()),
            &route.requirement,
            request_id::current(),
        )
        .await?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
