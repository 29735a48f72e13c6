//! Route definitions for the `/accidents` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::accidents;
use crate::state::AppState;

/// Routes mounted at `/accidents`.
///
/// ```text
/// GET  /active-accidents         -> active_accidents
/// GET  /handled-accidents        -> handled_accidents (filter query params)
/// POST /mark-as-handled          -> mark_as_handled
/// POST /update-accident-details  -> update_accident_details
/// POST /accident-status-update   -> accident_status_update
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/active-accidents", get(accidents::active_accidents))
        .route("/handled-accidents", get(accidents::handled_accidents))
        .route("/mark-as-handled", post(accidents::mark_as_handled))
        .route(
            "/update-accident-details",
            post(accidents::update_accident_details),
        )
        .route(
            "/accident-status-update",
            post(accidents::accident_status_update),
        )
}
