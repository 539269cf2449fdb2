//! Tenant administration handlers.

use axum::Json;
use axum::extract::{Path, State};

use kydohub_core::types::UserId;

use crate::dto::request::{AssignRolesRequest, validated};
use crate::dto::response::{ApiResponse, LogoutAllResponse, MembershipResponse};
use crate::error::ApiError;
use crate::extractors::auth::Auth;
use crate::state::AppState;

/// POST /api/admin/users/{user_id}/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: Auth,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<LogoutAllResponse>>, ApiError> {
    let ev = state.admin.logout_all(auth.tenant_id, user_id).await?;
    Ok(Json(ApiResponse::ok(LogoutAllResponse { user_id, ev })))
}

/// PUT /api/admin/users/{user_id}/roles
pub async fn assign_roles(
    State(state): State<AppState>,
    auth: Auth,
    Path(user_id): Path<UserId>,
    Json(req): Json<AssignRolesRequest>,
) -> Result<Json<ApiResponse<MembershipResponse>>, ApiError> {
    let req = validated(req)?;
    let membership = state
        .admin
        .assign_roles(auth.tenant_id, user_id, &req.roles)
        .await?;
    Ok(Json(ApiResponse::ok(membership.into())))
}
