//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login     -> login
/// POST /refresh   -> refresh (requires auth)
/// POST /logout    -> logout (requires auth)
/// POST /register  -> register (admin only)
/// GET  /logs      -> auth_logs (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/logs", get(auth::auth_logs))
}
