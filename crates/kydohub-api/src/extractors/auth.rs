//! Authorization context extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use kydohub_auth::AuthContext;
use kydohub_auth::guard::orchestrator::AUTH_REQUIRED_MESSAGE;
use kydohub_core::error::AppError;

use crate::error::ApiError;

/// The context the route guard stored for this request.
///
/// Only available on routes behind the guard layer; elsewhere the request
/// is treated as unauthenticated.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AppError::unauthenticated(AUTH_REQUIRED_MESSAGE).into())
    }
}

impl std::ops::Deref for Auth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
