//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET /get-all-users  -> get_all_users (admin only)
/// GET /get-role       -> get_role
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get-all-users", get(users::get_all_users))
        .route("/get-role", get(users::get_role))
}
