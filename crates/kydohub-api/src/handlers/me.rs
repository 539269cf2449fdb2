//! Caller context handler.

use axum::Json;
use axum::extract::State;

use kydohub_database::repositories::UiResourceRepository;

use crate::dto::response::{ApiResponse, ContextMeta, MeContextResponse};
use crate::error::ApiError;
use crate::extractors::auth::Auth;
use crate::state::AppState;

/// GET /api/me/context
pub async fn context(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<ApiResponse<MeContextResponse>>, ApiError> {
    let ui = state.store.ui_resources.get(ctx.tenant_id).await?.normalized();

    Ok(Json(ApiResponse::ok(MeContextResponse {
        tenant_id: ctx.tenant_id,
        user_id: ctx.user_id,
        roles: ctx.roles,
        permissions: ctx.permissions.into_iter().collect(),
        attrs: ctx.attrs,
        ui,
        meta: ContextMeta {
            ev: ctx.ev,
            request_id: ctx.request_id,
        },
    })))
}
