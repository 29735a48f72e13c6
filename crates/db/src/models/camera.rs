//! Camera row models and DTOs.

use crashalert_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cameras` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Camera {
    pub id: DbId,
    pub camera_id: String,
    pub location: String,
    pub demo_video: Option<String>,
    pub created_at: Timestamp,
}

/// A camera with its authorized users and accident ids, as listed on the
/// cameras page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CameraDetails {
    pub id: DbId,
    pub camera_id: String,
    pub location: String,
    pub demo_video: Option<String>,
    /// Usernames of the users assigned to this camera.
    pub users: Vec<String>,
    /// Ids of accidents on this camera that are still active or assigned.
    pub active_accidents: Vec<DbId>,
    /// Ids of handled accidents on this camera.
    pub accident_history: Vec<DbId>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CameraLocation {
    pub camera_id: String,
    pub location: String,
}

/// Camera listing for the detection service.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InternalCamera {
    pub camera_id: String,
    pub location: String,
    pub demo_video: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCamera {
    pub camera_id: String,
    pub location: String,
    pub demo_video: Option<String>,
    /// User ids to authorize on the new camera.
    pub users: Vec<DbId>,
}
