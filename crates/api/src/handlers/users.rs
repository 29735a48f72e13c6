//! Handlers for the `/users` resource.

use axum::extract::State;
use axum::Json;
use crashalert_db::models::user::UserResponse;
use crashalert_db::repositories::UserRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub username: String,
    pub role: String,
}

/// GET /api/v1/users/get-all-users
pub async fn get_all_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/v1/users/get-role
///
/// Answered from the token claims once the session is confirmed live.
pub async fn get_role(user: AuthUser) -> AppResult<Json<ApiResponse<RoleResponse>>> {
    Ok(Json(ApiResponse::ok(RoleResponse {
        username: user.username,
        role: user.role,
    })))
}
