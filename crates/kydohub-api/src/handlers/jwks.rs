//! Public key publication.

use axum::Json;
use axum::extract::State;
use jsonwebtoken::jwk::JwkSet;

use crate::state::AppState;

/// GET /.well-known/jwks.json
///
/// The RS256 verification key under its `kid`. A shared-secret deployment
/// publishes an empty set.
pub async fn jwks(State(state): State<AppState>) -> Json<JwkSet> {
    Json(state.codec.jwks().clone())
}
