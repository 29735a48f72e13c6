//! Route definitions for service-to-service calls.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::internal;
use crate::state::AppState;

/// Routes mounted at `/internal`. All require `X-Internal-Secret`.
///
/// ```text
/// POST /accidents  -> post_accident
/// GET  /cameras    -> get_cameras
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accidents", post(internal::post_accident))
        .route("/cameras", get(internal::get_cameras))
}
