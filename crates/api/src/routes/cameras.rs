//! Route definitions for the `/cameras` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cameras;
use crate::state::AppState;

/// Routes mounted at `/cameras`.
///
/// ```text
/// GET  /get-cameras      -> get_cameras
/// GET  /get-id_location  -> get_id_location
/// POST /assign-cameras   -> assign_cameras (admin only)
/// POST /add-camera       -> add_camera (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get-cameras", get(cameras::get_cameras))
        .route("/get-id_location", get(cameras::get_id_location))
        .route("/assign-cameras", post(cameras::assign_cameras))
        .route("/add-camera", post(cameras::add_camera))
}
