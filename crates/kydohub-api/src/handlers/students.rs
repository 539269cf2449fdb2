//! Student listing handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, StudentListResponse};
use crate::error::ApiError;
use crate::extractors::auth::Auth;
use crate::state::AppState;

/// GET /api/students
///
/// Rows outside the caller's room or guardianship scope are never returned.
pub async fn list(
    State(state): State<AppState>,
    auth: Auth,
) -> Result<Json<ApiResponse<StudentListResponse>>, ApiError> {
    let students = auth.scoped_query().students(&*state.store.students).await?;
    Ok(Json(ApiResponse::ok(students.into())))
}

/// GET /api/students/all
pub async fn list_all(
    State(state): State<AppState>,
    auth: Auth,
) -> Result<Json<ApiResponse<StudentListResponse>>, ApiError> {
    let students = auth.scoped_query().students(&*state.store.students).await?;
    Ok(Json(ApiResponse::ok(students.into())))
}
