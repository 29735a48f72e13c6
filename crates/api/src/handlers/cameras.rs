//! Handlers for the `/cameras` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use crashalert_core::error::CoreError;
use crashalert_core::types::DbId;
use crashalert_db::models::camera::{Camera, CameraDetails, CameraLocation, CreateCamera};
use crashalert_db::repositories::{CameraRepo, UserRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /cameras/add-camera`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCameraRequest {
    #[validate(length(min = 1, max = 100, message = "camera_id is required"))]
    pub camera_id: String,
    #[validate(length(min = 1, max = 255, message = "location is required"))]
    pub location: String,
    pub demo_video: Option<String>,
    /// Users to grant access to the new camera.
    #[serde(default)]
    pub users: Vec<DbId>,
}

/// Request body for `POST /cameras/assign-cameras`.
///
/// `camera_ids` becomes the user's complete camera set.
#[derive(Debug, Deserialize)]
pub struct AssignCamerasRequest {
    pub user_id: DbId,
    pub camera_ids: Vec<String>,
}

/// GET /api/v1/cameras/get-cameras
pub async fn get_cameras(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<CameraDetails>>>> {
    let cameras = CameraRepo::list_details(&state.pool).await?;
    Ok(Json(ApiResponse::ok(cameras)))
}

/// GET /api/v1/cameras/get-id_location
pub async fn get_id_location(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<CameraLocation>>>> {
    let locations = CameraRepo::list_locations(&state.pool).await?;
    Ok(Json(ApiResponse::ok(locations)))
}

/// POST /api/v1/cameras/assign-cameras
pub async fn assign_cameras(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<AssignCamerasRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;

    let mut camera_ids: Vec<String> = input
        .camera_ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    camera_ids.sort();
    camera_ids.dedup();

    let existing = CameraRepo::count_existing(&state.pool, &camera_ids).await?;
    if existing != camera_ids.len() as i64 {
        return Err(AppError::BadRequest(
            "One or more cameras do not exist".into(),
        ));
    }

    CameraRepo::assign_to_user(&state.pool, input.user_id, &camera_ids).await?;

    tracing::info!(
        user_id = input.user_id,
        cameras = camera_ids.len(),
        assigned_by = %admin.username,
        "Cameras assigned"
    );
    Ok(Json(ApiResponse::message("Cameras assigned")))
}

/// POST /api/v1/cameras/add-camera
pub async fn add_camera(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<AddCameraRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Camera>>)> {
    input.validate()?;
    let camera_id = input.camera_id.trim().to_string();

    if CameraRepo::find_by_camera_id(&state.pool, &camera_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Camera '{camera_id}' already exists"
        ))));
    }

    let mut users = input.users;
    users.sort_unstable();
    users.dedup();
    if !users.is_empty() {
        let existing = UserRepo::count_existing(&state.pool, &users).await?;
        if existing != users.len() as i64 {
            return Err(AppError::BadRequest("One or more users do not exist".into()));
        }
    }

    let camera = CameraRepo::create(
        &state.pool,
        &CreateCamera {
            camera_id,
            location: input.location.trim().to_string(),
            demo_video: input.demo_video.filter(|v| !v.trim().is_empty()),
            users,
        },
    )
    .await?;

    tracing::info!(camera_id = %camera.camera_id, added_by = %admin.username, "Camera added");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(camera).with_message("Camera added")),
    ))
}
